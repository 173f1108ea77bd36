//! # Entries
//!
//! One guestbook submission. Stored as a JSON string per list element, newest at the head.
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    database::ListService,
    error::{
        AppError::{self, MalformedPayload},
        StoreError,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub username: Option<String>,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Entry {
    /// Builds an entry from the `entry` object of a submitted payload. Missing fields come
    /// out empty; a field that is present but not text is a malformed payload.
    pub fn from_payload(payload: &Value) -> Result<Self, AppError> {
        let entry = &payload["entry"];
        let text = |key: &str| match &entry[key] {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(text.clone())),
            _ => Err(MalformedPayload),
        };

        Ok(Self {
            username: text("username")?.filter(|name| !name.is_empty()),
            title: text("title")?.unwrap_or_default(),
            body: text("body")?.unwrap_or_default(),
        })
    }

    pub fn serialize(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn deserialize(item: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(item)?)
    }
}

#[derive(Clone)]
pub struct EntryStore {
    list: Arc<dyn ListService>,
    key: String,
}

impl EntryStore {
    pub fn new(list: Arc<dyn ListService>, key: impl Into<String>) -> Self {
        Self {
            list,
            key: key.into(),
        }
    }

    pub async fn append(&self, entry: &Entry) -> Result<(), StoreError> {
        let item = entry.serialize()?;

        #[cfg(feature = "verbose")]
        tracing::info!("Pushing {item}");

        self.list.push_head(&self.key, item).await?;

        debug!("Appended entry {:?} to {}", entry.title, self.key);

        Ok(())
    }

    /// Inclusive range, `-1` is the last element. A single bad element fails the whole read.
    pub async fn get_range(&self, from: isize, to: isize) -> Result<Vec<Entry>, StoreError> {
        self.list
            .range(&self.key, from, to)
            .await?
            .iter()
            .map(|item| Entry::deserialize(item))
            .collect()
    }

    pub async fn all(&self) -> Result<Vec<Entry>, StoreError> {
        self.get_range(0, -1).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use redis::ErrorKind;
    use serde_json::json;

    use super::*;
    use crate::database::MemoryList;

    struct FailingList;

    #[async_trait]
    impl ListService for FailingList {
        async fn push_head(&self, _key: &str, _value: String) -> Result<(), StoreError> {
            Err(redis::RedisError::from((ErrorKind::IoError, "connection refused")).into())
        }

        async fn range(&self, _key: &str, _start: isize, _stop: isize) -> Result<Vec<String>, StoreError> {
            Err(redis::RedisError::from((ErrorKind::IoError, "connection refused")).into())
        }
    }

    fn entry(title: &str) -> Entry {
        Entry {
            username: None,
            title: title.to_string(),
            body: format!("{title} body"),
        }
    }

    fn memory_store() -> (Arc<MemoryList>, EntryStore) {
        let list = Arc::new(MemoryList::new());
        let store = EntryStore::new(list.clone(), "entries");

        (list, store)
    }

    #[test]
    fn round_trips_every_field() {
        let original = Entry {
            username: Some("tobi".to_string()),
            title: "Hello".to_string(),
            body: "First!".to_string(),
        };

        let restored = Entry::deserialize(&original.serialize().unwrap()).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn absent_username_is_stored_as_null() {
        let item = entry("Hello").serialize().unwrap();
        let value: Value = serde_json::from_str(&item).unwrap();

        assert_eq!(value["username"], Value::Null);
    }

    #[test]
    fn builds_from_payload() {
        let payload = json!({ "entry": { "title": "Hello", "body": "World" } });

        assert_eq!(
            Entry::from_payload(&payload).unwrap(),
            Entry {
                username: None,
                title: "Hello".to_string(),
                body: "World".to_string(),
            }
        );
    }

    #[test]
    fn non_text_fields_are_malformed() {
        for payload in [
            json!({ "entry": { "title": "Hello", "body": 42 } }),
            json!({ "entry": { "title": "Hello", "username": ["tobi"] } }),
            json!({ "entry": { "title": { "text": "Hello" } } }),
        ] {
            assert!(matches!(Entry::from_payload(&payload), Err(MalformedPayload)));
        }
    }

    #[test]
    fn missing_body_and_empty_username_come_out_empty() {
        let payload = json!({ "entry": { "title": "Hello", "username": "" } });

        let entry = Entry::from_payload(&payload).unwrap();

        assert_eq!(entry.username, None);
        assert_eq!(entry.body, "");
    }

    #[tokio::test]
    async fn newest_entry_comes_first() {
        let (_, store) = memory_store();
        store.append(&entry("first")).await.unwrap();
        store.append(&entry("second")).await.unwrap();

        let entries = store.all().await.unwrap();

        assert_eq!(entries, vec![entry("second"), entry("first")]);
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let (_, store) = memory_store();

        assert!(store.get_range(0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_range() {
        let (_, store) = memory_store();
        for title in ["a", "b", "c"] {
            store.append(&entry(title)).await.unwrap();
        }

        let entries = store.get_range(0, 1).await.unwrap();

        assert_eq!(entries, vec![entry("c"), entry("b")]);
    }

    #[tokio::test]
    async fn bad_element_aborts_whole_read() {
        let (list, store) = memory_store();
        store.append(&entry("good")).await.unwrap();
        list.push_head("entries", "{not json".to_string()).await.unwrap();
        store.append(&entry("also good")).await.unwrap();

        let result = store.all().await;

        assert!(matches!(result, Err(StoreError::Parse(_))));
    }

    #[tokio::test]
    async fn list_service_failure_surfaces() {
        let store = EntryStore::new(Arc::new(FailingList), "entries");

        assert!(matches!(store.all().await, Err(StoreError::Command(_))));
        assert!(matches!(
            store.append(&entry("lost")).await,
            Err(StoreError::Command(_))
        ));
    }
}
