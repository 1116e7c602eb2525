use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::TrackId;

/// A mutable copy of one track's tag fields. Field names are
/// case-insensitive and stored upper-case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct MetadataBlob {
    fields: BTreeMap<String, String>,
}

impl MetadataBlob {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(&field_key(name)).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.fields.insert(field_key(name), value.to_string());
    }

    /// Remove a field, returning whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.fields.remove(&field_key(name)).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<BTreeMap<String, String>> for MetadataBlob {
    fn from(raw: BTreeMap<String, String>) -> Self {
        Self {
            fields: raw.into_iter().map(|(k, v)| (field_key(&k), v)).collect(),
        }
    }
}

impl From<MetadataBlob> for BTreeMap<String, String> {
    fn from(blob: MetadataBlob) -> Self {
        blob.fields
    }
}

fn field_key(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// The host's asynchronous metadata I/O.
///
/// `submit_update` returns immediately. Once the update has been applied the
/// host broadcasts the changed identities, which must be routed to
/// [`TagWriter::on_items_changed`](super::TagWriter::on_items_changed) on
/// the same thread, never from inside `submit_update`.
pub trait MetadataService {
    /// Current tags of a track, or `None` when they cannot be read.
    fn fetch_mutable_info(&self, id: TrackId) -> Option<MetadataBlob>;

    /// Queue new tags for the given tracks. `ids` and `blobs` are aligned.
    fn submit_update(&self, ids: Vec<TrackId>, blobs: Vec<MetadataBlob>, deferred_ui_refresh: bool);
}

/// Host popup used when a finished batch has no continuation of its own.
pub trait MessageSink {
    fn show_message(&self, title: &str, text: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_ignore_case() {
        let mut blob = MetadataBlob::default();
        blob.set("Dynamic Range", "12");
        assert_eq!(blob.get("DYNAMIC RANGE"), Some("12"));
        blob.set("dynamic range", "13");
        assert_eq!(blob.len(), 1);
        assert_eq!(blob.get("Dynamic Range"), Some("13"));
        assert!(blob.remove("DYNAMIC range"));
        assert!(!blob.remove("DYNAMIC RANGE"));
        assert!(blob.is_empty());
    }

    #[test]
    fn test_deserialize_normalizes_keys() {
        let blob: MetadataBlob = serde_json::from_str(r#"{"artist": "Low", "Title": "Words"}"#).unwrap();
        assert_eq!(blob.get("ARTIST"), Some("Low"));
        let json = serde_json::to_string(&blob).unwrap();
        assert_eq!(json, r#"{"ARTIST":"Low","TITLE":"Words"}"#);
    }
}
