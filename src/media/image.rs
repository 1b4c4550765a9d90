use serde::{Deserialize, Serialize};

/// One remotely-hosted image. `public_id` is the key the media store deletes by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub public_id: String,
}

impl ImageRef {
    pub fn new(url: impl Into<String>, public_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_id: public_id.into(),
        }
    }
}

/// Ordered image set owned by a single page or report, stored as a JSONB array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageCollection(Vec<ImageRef>);

impl ImageCollection {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageRef> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ImageRef] {
        &self.0
    }

    pub fn contains(&self, public_id: &str) -> bool {
        self.0.iter().any(|img| img.public_id == public_id)
    }

    pub fn public_ids(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|img| img.public_id.as_str())
    }

    /// Entries of `self` that were not part of `previous`, in order.
    pub fn added_since(&self, previous: &ImageCollection) -> Vec<ImageRef> {
        self.0
            .iter()
            .filter(|img| !previous.contains(&img.public_id))
            .cloned()
            .collect()
    }
}

impl From<Vec<ImageRef>> for ImageCollection {
    fn from(images: Vec<ImageRef>) -> Self {
        Self(images)
    }
}

impl<'a> IntoIterator for &'a ImageCollection {
    type Item = &'a ImageRef;
    type IntoIter = std::slice::Iter<'a, ImageRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A raw file received from a multipart form, not yet uploaded.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub const MAX_BYTES: usize = 5 * 1024 * 1024;

    pub const ALLOWED_TYPES: [&'static str; 5] = [
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/gif",
        "image/webp",
    ];

    pub fn is_allowed_type(&self) -> bool {
        Self::ALLOWED_TYPES.contains(&self.content_type.as_str())
    }
}

/// Per-entity capacity and remote folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePolicy {
    pub max: usize,
    pub folder: &'static str,
}

impl ImagePolicy {
    pub const PAGE: ImagePolicy = ImagePolicy { max: 5, folder: "pages" };
    pub const REPORT: ImagePolicy = ImagePolicy { max: 2, folder: "reports" };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_array() {
        let images = ImageCollection::from(vec![ImageRef::new("https://cdn/a.png", "pages/a")]);
        let value = serde_json::to_value(&images).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "url": "https://cdn/a.png", "public_id": "pages/a" }])
        );
    }

    #[test]
    fn added_since_lists_only_new_entries() {
        let before = ImageCollection::from(vec![ImageRef::new("a", "pA"), ImageRef::new("b", "pB")]);
        let after = ImageCollection::from(vec![ImageRef::new("b", "pB"), ImageRef::new("c", "pC")]);
        assert_eq!(after.added_since(&before), vec![ImageRef::new("c", "pC")]);
    }

    #[test]
    fn only_images_are_allowed() {
        let mut file = UploadFile {
            file_name: "x.png".into(),
            content_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        };
        assert!(file.is_allowed_type());
        file.content_type = "application/pdf".into();
        assert!(!file.is_allowed_type());
    }
}
