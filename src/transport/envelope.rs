//! # Envelope Adapter
//!
//! Backends wrap payloads in `{success, data, meta}` but not consistently. A list can
//! arrive as a bare array, as `data: [...]`, as `data: {items: [...]}`, or under the
//! resource's own collection key (`{"tenants": [...], "pagination": {...}}`). Paging
//! metadata may be called `meta` or `pagination` and may sit beside or inside `data`.
//!
//! Everything here is a pure function from JSON to canonical shapes so the tolerance
//! rules can be tested without a server.

use resource_sync::{Page, PageMeta, TransportError};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

const META_KEYS: [&str; 2] = ["meta", "pagination"];

/// The payload of a single-object response: `data` when present, else the body itself.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut object) if object.contains_key("data") => {
            object.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decodes a single-object response.
pub fn item<T: DeserializeOwned>(status: u16, body: Value) -> Result<T, TransportError> {
    decode(status, unwrap_data(body))
}

/// Decodes a list response, looking for the items under `collection_key` or `items` when
/// they are not a bare array.
pub fn list_page<T: DeserializeOwned>(
    status: u16,
    body: Value,
    collection_key: &str,
) -> Result<Page<T>, TransportError> {
    let meta = find_meta(&body);
    let items = find_items(body, collection_key).ok_or_else(|| TransportError::Decode {
        status,
        reason: format!("no '{collection_key}' list in response"),
    })?;
    let items: Vec<T> = decode(status, items)?;
    Ok(Page::new(items, meta))
}

fn find_items(body: Value, collection_key: &str) -> Option<Value> {
    match body {
        Value::Array(_) => Some(body),
        Value::Object(mut object) => match object.remove("data") {
            Some(data @ Value::Array(_)) => Some(data),
            Some(Value::Object(mut data)) => take_collection(&mut data, collection_key),
            _ => take_collection(&mut object, collection_key),
        },
        _ => None,
    }
}

fn take_collection(object: &mut Map<String, Value>, collection_key: &str) -> Option<Value> {
    [collection_key, "items"]
        .into_iter()
        .find_map(|key| object.remove(key).filter(Value::is_array))
}

fn find_meta(body: &Value) -> PageMeta {
    let nested = body.get("data").filter(|data| data.is_object());
    let found = [Some(body), nested]
        .into_iter()
        .flatten()
        .flat_map(|scope| META_KEYS.into_iter().filter_map(move |key| scope.get(key)))
        .find(|meta| meta.is_object());

    match found {
        Some(meta) => serde_json::from_value(meta.clone()).unwrap_or_else(|e| {
            debug!(error = %e, "Ignoring unreadable paging metadata");
            PageMeta::default()
        }),
        None => PageMeta::default(),
    }
}

fn decode<T: DeserializeOwned>(status: u16, value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|e| TransportError::Decode {
        status,
        reason: e.to_string(),
    })
}
