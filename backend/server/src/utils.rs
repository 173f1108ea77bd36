use axum::{
    body::Bytes,
    http::{HeaderMap, header::CONTENT_TYPE},
};
use serde_json::{Map, Value};

use crate::{
    error::AppError::{self, MalformedPayload},
    field::FieldPath,
};

/// Decodes a request body into one nested object. JSON bodies are taken as is, anything
/// else is read as a urlencoded form whose bracket names nest, so `entry[title]=Hi`
/// becomes `{"entry": {"title": "Hi"}}`.
pub fn get_payload_from_body(headers: &HeaderMap, body: &Bytes) -> Result<Value, AppError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"));

    if is_json {
        return serde_json::from_slice(body).map_err(|_| MalformedPayload);
    }

    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(body).map_err(|_| MalformedPayload)?;

    let mut payload = Value::Object(Map::new());
    for (name, value) in pairs {
        insert(&mut payload, &FieldPath::parse(&name), Value::String(value));
    }

    Ok(payload)
}

fn insert(root: &mut Value, path: &FieldPath, value: Value) {
    let Some((last, parents)) = path.segments().split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        let Some(map) = make_object(current) else {
            return;
        };

        current = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if let Some(map) = make_object(current) {
        map.insert(last.clone(), value);
    }
}

/// Later fields win: a plain value in the way of a nested name is replaced by an object.
fn make_object(value: &mut Value) -> Option<&mut Map<String, Value>> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }

    value.as_object_mut()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use serde_json::json;

    use super::*;

    fn form(body: &'static str) -> Value {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        get_payload_from_body(&headers, &Bytes::from_static(body.as_bytes())).unwrap()
    }

    #[test]
    fn nests_bracket_names() {
        let payload = form("entry%5Btitle%5D=Hello+there&entry%5Bbody%5D=Hi");

        assert_eq!(
            payload,
            json!({ "entry": { "title": "Hello there", "body": "Hi" } })
        );
    }

    #[test]
    fn plain_names_stay_flat() {
        assert_eq!(form("title=Hi"), json!({ "title": "Hi" }));
    }

    #[test]
    fn nested_name_replaces_plain_value() {
        assert_eq!(
            form("entry=x&entry%5Btitle%5D=Hi"),
            json!({ "entry": { "title": "Hi" } })
        );
    }

    #[test]
    fn deep_name_replaces_plain_values_on_the_way() {
        assert_eq!(
            form("a=x&a%5Bb%5D=y&a%5Bb%5D%5Bc%5D=z"),
            json!({ "a": { "b": { "c": "z" } } })
        );
    }

    #[test]
    fn empty_names_are_dropped() {
        assert_eq!(form("%5B%5D=x"), json!({}));
    }

    #[test]
    fn json_body_is_used_directly() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = Bytes::from_static(br#"{"entry":{"title":"Hello"}}"#);

        assert_eq!(
            get_payload_from_body(&headers, &body).unwrap(),
            json!({ "entry": { "title": "Hello" } })
        );
    }

    #[test]
    fn broken_json_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let result = get_payload_from_body(&headers, &Bytes::from_static(b"{"));

        assert!(matches!(result, Err(MalformedPayload)));
    }
}
