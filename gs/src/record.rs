//! Persisted gallery record

use serde::{Deserialize, Serialize};

/// One saved infographic, stored flat
///
/// `image_url` is either a remote `http(s)` URL or an inline `data:` URL when
/// the image host was unreachable at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryRecord {
    pub id: String,
    /// Creation time (unix ms)
    pub timestamp: i64,
    pub title: String,
    pub domain: String,
    pub text: String,
    pub plan: String,
    pub image_url: String,
}

impl GalleryRecord {
    /// Whether the image lives on a remote host
    pub fn is_remote(&self) -> bool {
        self.image_url.starts_with("http")
    }
}

/// One line of the store log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub(crate) enum LogEntry {
    Upsert {
        record: GalleryRecord,
    },
    SetImage {
        id: String,
        #[serde(rename = "imageUrl")]
        image_url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> GalleryRecord {
        GalleryRecord {
            id: "0193a1-abc".to_string(),
            timestamp: 1_700_000_000_000,
            title: "Lava Lakes".to_string(),
            domain: "Geology".to_string(),
            text: "Some volcanoes hold lakes of molten rock.".to_string(),
            plan: "PLAN: title banner".to_string(),
            image_url: "https://ik.imagekit.io/demo/0193a1-abc.png".to_string(),
        }
    }

    #[test]
    fn test_record_uses_camel_case() {
        let json = serde_json::to_value(record()).unwrap();
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("image_url").is_none());
    }

    #[test]
    fn test_log_entry_tags() {
        let line = serde_json::to_string(&LogEntry::SetImage {
            id: "x".to_string(),
            image_url: "data:image/png;base64,AAAA".to_string(),
        })
        .unwrap();
        assert!(line.contains(r#""op":"set-image""#));
        assert!(line.contains(r#""imageUrl""#));

        let parsed: LogEntry = serde_json::from_str(&serde_json::to_string(&LogEntry::Upsert { record: record() }).unwrap()).unwrap();
        assert!(matches!(parsed, LogEntry::Upsert { .. }));
    }

    #[test]
    fn test_is_remote() {
        let mut r = record();
        assert!(r.is_remote());
        r.image_url = "data:image/png;base64,AAAA".to_string();
        assert!(!r.is_remote());
    }
}
