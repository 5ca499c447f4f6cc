//! Rendered images and stored image references

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

/// An image returned by the image model, held in memory until saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// MIME type, e.g. `image/png`
    pub mime_type: String,
    /// Standard base64 payload
    pub data: String,
}

impl RenderedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    /// Self-contained `data:` URL, the local encoding stored on upload failure
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Parse a `data:<mime>;base64,<payload>` URL
    pub fn from_data_url(url: &str) -> Option<Self> {
        debug!(len = url.len(), "RenderedImage::from_data_url: called");
        let rest = url.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        if mime_type.is_empty() || payload.is_empty() {
            return None;
        }
        Some(Self::new(mime_type, payload))
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }

    /// Decode the payload to raw bytes
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.data.as_bytes())
    }
}

/// Where a saved image lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Uploaded to the image host
    Remote { url: String },
    /// Upload failed or was skipped; the image is embedded as a data URL
    Local { data_url: String },
}

impl ImageRef {
    /// Classify a stored reference by its prefix
    pub fn from_stored(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.starts_with("http") {
            Self::Remote { url: value }
        } else {
            Self::Local { data_url: value }
        }
    }

    pub fn local(image: &RenderedImage) -> Self {
        Self::Local {
            data_url: image.to_data_url(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// The string persisted in the gallery
    pub fn as_str(&self) -> &str {
        match self {
            Self::Remote { url } => url,
            Self::Local { data_url } => data_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_round_trip() {
        let image = RenderedImage::from_bytes("image/png", b"\x89PNG");
        let url = image.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        let parsed = RenderedImage::from_data_url(&url).unwrap();
        assert_eq!(parsed, image);
        assert_eq!(parsed.decode().unwrap(), b"\x89PNG");
    }

    #[test]
    fn test_from_data_url_rejects_garbage() {
        assert!(RenderedImage::from_data_url("https://example.com/a.png").is_none());
        assert!(RenderedImage::from_data_url("data:image/png,abc").is_none());
        assert!(RenderedImage::from_data_url("data:;base64,abc").is_none());
    }

    #[test]
    fn test_extension() {
        assert_eq!(RenderedImage::new("image/jpeg", "x").extension(), "jpg");
        assert_eq!(RenderedImage::new("image/png", "x").extension(), "png");
        assert_eq!(RenderedImage::new("application/octet-stream", "x").extension(), "png");
    }

    #[test]
    fn test_image_ref_classification() {
        assert!(ImageRef::from_stored("https://ik.imagekit.io/a.png").is_remote());
        assert!(ImageRef::from_stored("http://localhost/a.png").is_remote());
        let local = ImageRef::from_stored("data:image/png;base64,AAAA");
        assert!(!local.is_remote());
        assert_eq!(local.as_str(), "data:image/png;base64,AAAA");
    }
}
