//! # Redis
//!
//! RAM database.
//!
//! Core purpose is to hold the guestbook as one Redis list of JSON strings.
//!
//! ## Requirements
//!
//! - Append-only, entries are never edited or removed
//! - Newest entry first when listing
//! - Single shared connection, opened before the first request
//!
//! ## Implementation
//!
//! - Redis list: 1 key (`entries` by default), one JSON string per element
//! - `LPUSH` puts the new entry at index 0, every older entry shifts by one
//! - `LRANGE key 0 -1` reads the whole list head to tail, so newest first
//! - Redis serializes individual commands, no multi-command transactions are needed
//!
//! Anything that speaks these two commands implements [`ListService`]. [`MemoryList`]
//! follows the same index rules in-process and backs the tests.
use std::collections::HashMap;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, ConnectionInfo,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::StoreError;

#[async_trait]
pub trait ListService: Send + Sync {
    /// `LPUSH key value`
    async fn push_head(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// `LRANGE key start stop`, inclusive on both ends, negative indices count from the end.
    async fn range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, StoreError>;
}

pub async fn init_redis(connection_info: ConnectionInfo) -> Result<ConnectionManager, StoreError> {
    let config = ConnectionManagerConfig::new().set_number_of_retries(1);

    let client = Client::open(connection_info)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    info!("Connected to Redis");

    Ok(connection_manager)
}

pub struct RedisList {
    connection: ConnectionManager,
}

impl RedisList {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ListService for RedisList {
    async fn push_head(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        connection.lpush::<_, _, ()>(key, value).await?;

        Ok(())
    }

    async fn range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, StoreError> {
        let mut connection = self.connection.clone();

        Ok(connection
            .lrange::<_, Vec<String>>(key, start, stop)
            .await?)
    }
}

/// In-process list with Redis list indexing.
#[derive(Default)]
pub struct MemoryList {
    lists: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryList {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ListService for MemoryList {
    async fn push_head(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.lists
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .insert(0, value);

        Ok(())
    }

    async fn range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, StoreError> {
        let lists = self.lists.lock().await;

        let Some(list) = lists.get(key) else {
            return Ok(Vec::new());
        };

        Ok(match range_bounds(list.len(), start, stop) {
            Some((first, last)) => list[first..=last].to_vec(),
            None => Vec::new(),
        })
    }
}

/// Resolves `LRANGE` indices against a list of `len` elements. `None` means an empty result.
fn range_bounds(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;

    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len {
        return None;
    }

    Some((start as usize, stop as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_list() {
        assert_eq!(range_bounds(3, 0, -1), Some((0, 2)));
    }

    #[test]
    fn empty_list_has_no_range() {
        assert_eq!(range_bounds(0, 0, -1), None);
    }

    #[test]
    fn stop_past_end_is_clamped() {
        assert_eq!(range_bounds(3, 1, 10), Some((1, 2)));
    }

    #[test]
    fn negative_indices_count_from_end() {
        assert_eq!(range_bounds(5, -2, -1), Some((3, 4)));
        assert_eq!(range_bounds(5, -10, 1), Some((0, 1)));
        assert_eq!(range_bounds(5, 0, -10), None);
    }

    #[test]
    fn start_after_stop_is_empty() {
        assert_eq!(range_bounds(5, 3, 1), None);
        assert_eq!(range_bounds(5, 7, 9), None);
    }

    #[tokio::test]
    async fn memory_list_pushes_to_head() {
        let list = MemoryList::new();
        list.push_head("entries", "first".to_string()).await.unwrap();
        list.push_head("entries", "second".to_string()).await.unwrap();

        let items = list.range("entries", 0, -1).await.unwrap();

        assert_eq!(items, ["second", "first"]);
    }

    #[tokio::test]
    async fn memory_list_keys_are_separate() {
        let list = MemoryList::new();
        list.push_head("entries", "one".to_string()).await.unwrap();

        assert!(list.range("other", 0, -1).await.unwrap().is_empty());
    }
}
