//! Gallery item shape used by the pipeline and the presentation layer

use gallerystore::GalleryRecord;

use super::{Fact, ImageRef, Plan};

/// A saved infographic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItem {
    pub id: String,
    /// Creation time (unix ms)
    pub created_at: i64,
    pub image_ref: ImageRef,
    pub plan: Plan,
    pub fact: Fact,
}

impl GalleryItem {
    /// Flatten into the persisted record shape
    pub fn to_record(&self) -> GalleryRecord {
        GalleryRecord {
            id: self.id.clone(),
            timestamp: self.created_at,
            title: self.fact.title.clone(),
            domain: self.fact.domain.clone(),
            text: self.fact.text.clone(),
            plan: self.plan.as_str().to_string(),
            image_url: self.image_ref.as_str().to_string(),
        }
    }
}

impl From<GalleryRecord> for GalleryItem {
    fn from(record: GalleryRecord) -> Self {
        Self {
            id: record.id,
            created_at: record.timestamp,
            image_ref: ImageRef::from_stored(record.image_url),
            plan: Plan::new(record.plan),
            fact: Fact {
                title: record.title,
                domain: record.domain,
                text: record.text,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_conversion_keeps_fields() {
        let item = GalleryItem {
            id: "0193-x".to_string(),
            created_at: 42,
            image_ref: ImageRef::from_stored("https://cdn.example.com/x.png"),
            plan: Plan::new("PLAN"),
            fact: Fact::new("Tides", "Oceanography", "The moon pulls the sea."),
        };

        let record = item.to_record();
        assert_eq!(record.timestamp, 42);
        assert_eq!(record.domain, "Oceanography");
        assert_eq!(record.image_url, "https://cdn.example.com/x.png");

        assert_eq!(GalleryItem::from(record), item);
    }
}
