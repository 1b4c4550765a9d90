use std::collections::BTreeSet;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::image::{ImageCollection, ImagePolicy, ImageRef, UploadFile};
use super::store::{MediaError, MediaStore};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Image '{0}' does not belong to this document")]
    InvalidReference(String),

    #[error("Max {max} images. Remaining: {remaining}, can add: {can_add}")]
    CapacityExceeded {
        max: usize,
        remaining: usize,
        can_add: usize,
    },

    #[error("Image upload failed: {0}")]
    UploadFailed(#[source] MediaError),
}

/// Requested change to an image collection.
#[derive(Debug, Default)]
pub struct SyncRequest {
    pub to_delete: BTreeSet<String>,
    pub to_add: Vec<UploadFile>,
}

impl SyncRequest {
    pub fn new(to_delete: impl IntoIterator<Item = String>, to_add: Vec<UploadFile>) -> Self {
        Self {
            to_delete: to_delete.into_iter().collect(),
            to_add,
        }
    }

    pub fn add_only(to_add: Vec<UploadFile>) -> Self {
        Self {
            to_delete: BTreeSet::new(),
            to_add,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_add.is_empty()
    }
}

/// Applies add/remove requests to a bounded image collection against a media store.
///
/// Uploads always run before deletions, so a failed upload never costs the
/// document an image it already had. Persisting the returned collection is
/// the caller's job.
pub struct ImageSynchronizer<'a> {
    store: &'a dyn MediaStore,
    policy: ImagePolicy,
}

impl<'a> ImageSynchronizer<'a> {
    pub fn new(store: &'a dyn MediaStore, policy: ImagePolicy) -> Self {
        Self { store, policy }
    }

    /// Side-effect free precondition check.
    pub fn check(&self, current: &ImageCollection, request: &SyncRequest) -> Result<(), SyncError> {
        if let Some(unknown) = request.to_delete.iter().find(|id| !current.contains(id)) {
            return Err(SyncError::InvalidReference(unknown.clone()));
        }

        let remaining = current.len().saturating_sub(request.to_delete.len());
        if remaining + request.to_add.len() > self.policy.max {
            return Err(SyncError::CapacityExceeded {
                max: self.policy.max,
                remaining,
                can_add: self.policy.max.saturating_sub(remaining),
            });
        }

        Ok(())
    }

    pub async fn apply(
        &self,
        current: &ImageCollection,
        request: SyncRequest,
    ) -> Result<ImageCollection, SyncError> {
        self.check(current, &request)?;

        let uploaded = self.upload_all(&request.to_add).await?;

        if !request.to_delete.is_empty() {
            self.delete_best_effort(request.to_delete.iter().map(String::as_str)).await;
        }

        let mut images: Vec<ImageRef> = current
            .iter()
            .filter(|img| !request.to_delete.contains(&img.public_id))
            .cloned()
            .collect();
        images.extend(uploaded);

        debug!(
            folder = self.policy.folder,
            count = images.len(),
            "image collection synchronized"
        );
        Ok(ImageCollection::from(images))
    }

    /// Remote-delete refs produced by an `apply` whose result was never persisted.
    pub async fn discard(&self, refs: &[ImageRef]) {
        if refs.is_empty() {
            return;
        }
        self.delete_best_effort(refs.iter().map(|img| img.public_id.as_str())).await;
    }

    /// Remote-delete every member; used when the owning document goes away.
    pub async fn purge(&self, collection: &ImageCollection) {
        if collection.is_empty() {
            return;
        }
        self.delete_best_effort(collection.public_ids()).await;
    }

    async fn upload_all(&self, files: &[UploadFile]) -> Result<Vec<ImageRef>, SyncError> {
        let mut uploaded = Vec::with_capacity(files.len());

        for file in files {
            debug!(file = %file.file_name, folder = self.policy.folder, "uploading image");
            match self.store.upload(self.policy.folder, file).await {
                Ok(image) => {
                    info!(public_id = %image.public_id, "image uploaded");
                    uploaded.push(image);
                }
                Err(err) => {
                    warn!(
                        file = %file.file_name,
                        rollback = uploaded.len(),
                        "image upload failed, rolling back: {}",
                        err
                    );
                    self.discard(&uploaded).await;
                    return Err(SyncError::UploadFailed(err));
                }
            }
        }

        Ok(uploaded)
    }

    async fn delete_best_effort<'i>(&self, public_ids: impl Iterator<Item = &'i str>) {
        let deletions = public_ids.map(|public_id| async move {
            match self.store.delete(public_id).await {
                Ok(()) => info!(public_id, "image deleted"),
                Err(err) => warn!(public_id, "image delete failed: {}", err),
            }
        });
        join_all(deletions).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{upload_file, FakeMediaStore};

    fn collection(ids: &[&str]) -> ImageCollection {
        ImageCollection::from(
            ids.iter()
                .map(|id| ImageRef::new(format!("https://media.test/{id}"), *id))
                .collect::<Vec<_>>(),
        )
    }

    fn files(n: usize) -> Vec<UploadFile> {
        (0..n).map(|i| upload_file(&format!("file{i}.png"))).collect()
    }

    #[tokio::test]
    async fn result_length_follows_request() {
        let store = FakeMediaStore::new();
        let sync = ImageSynchronizer::new(&store, ImagePolicy::PAGE);
        let current = collection(&["p1", "p2", "p3"]);

        let request = SyncRequest::new(vec!["p1".to_string(), "p3".to_string()], files(3));
        let result = sync.apply(&current, request).await.unwrap();

        assert_eq!(result.len(), 3 - 2 + 3);
        assert_eq!(result.as_slice()[0].public_id, "p2");
        assert_eq!(store.uploads().len(), 3);
        let mut deleted = store.deletes();
        deleted.sort();
        assert_eq!(deleted, vec!["p1".to_string(), "p3".to_string()]);
    }

    #[tokio::test]
    async fn unknown_reference_is_rejected_without_side_effects() {
        let store = FakeMediaStore::new();
        let sync = ImageSynchronizer::new(&store, ImagePolicy::PAGE);
        let current = collection(&["p1"]);

        let request = SyncRequest::new(vec!["p1".to_string(), "ghost".to_string()], files(1));
        let err = sync.apply(&current, request).await.unwrap_err();

        assert!(matches!(err, SyncError::InvalidReference(ref id) if id == "ghost"));
        assert_eq!(current, collection(&["p1"]));
        assert!(store.uploads().is_empty());
        assert!(store.deletes().is_empty());
    }

    #[tokio::test]
    async fn capacity_boundary() {
        let store = FakeMediaStore::new();
        let sync = ImageSynchronizer::new(&store, ImagePolicy::PAGE);
        let full = collection(&["p1", "p2", "p3", "p4", "p5"]);

        let err = sync.apply(&full, SyncRequest::add_only(files(1))).await.unwrap_err();
        match err {
            SyncError::CapacityExceeded { max, remaining, can_add } => {
                assert_eq!((max, remaining, can_add), (5, 5, 0));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.uploads().is_empty());

        let request = SyncRequest::new(vec!["p2".to_string()], files(1));
        let result = sync.apply(&full, request).await.unwrap();
        assert_eq!(result.len(), 5);
    }

    #[tokio::test]
    async fn capacity_message_reports_how_many_may_be_added() {
        let store = FakeMediaStore::new();
        let sync = ImageSynchronizer::new(&store, ImagePolicy::REPORT);
        let current = collection(&["r1"]);

        let err = sync.apply(&current, SyncRequest::add_only(files(2))).await.unwrap_err();
        assert_eq!(err.to_string(), "Max 2 images. Remaining: 1, can add: 1");
    }

    #[tokio::test]
    async fn failed_upload_rolls_back_earlier_uploads() {
        let store = FakeMediaStore::new().fail_upload_at(1);
        let sync = ImageSynchronizer::new(&store, ImagePolicy::PAGE);
        let current = collection(&["keep"]);

        let request = SyncRequest::new(vec!["keep".to_string()], files(3));
        let err = sync.apply(&current, request).await.unwrap_err();

        assert!(matches!(err, SyncError::UploadFailed(_)));
        assert_eq!(current, collection(&["keep"]));
        // first upload succeeded, second failed, third never attempted
        assert_eq!(store.uploads().len(), 2);
        let deletes = store.deletes();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0], store.issued()[0].public_id);
        assert!(!deletes.contains(&"keep".to_string()));
    }

    #[tokio::test]
    async fn delete_failures_do_not_abort() {
        let store = FakeMediaStore::new().fail_delete_of("p1");
        let sync = ImageSynchronizer::new(&store, ImagePolicy::PAGE);
        let current = collection(&["p1", "p2"]);

        let request = SyncRequest::new(vec!["p1".to_string()], Vec::new());
        let result = sync.apply(&current, request).await.unwrap();

        assert_eq!(result, collection(&["p2"]));
    }

    #[tokio::test]
    async fn replaces_single_image_end_to_end() {
        let store = FakeMediaStore::new().with_scripted(vec![ImageRef::new("b", "pB")]);
        let sync = ImageSynchronizer::new(&store, ImagePolicy { max: 2, folder: "reports" });
        let current = ImageCollection::from(vec![ImageRef::new("a", "pA")]);

        let request = SyncRequest::new(vec!["pA".to_string()], vec![upload_file("x.png")]);
        let result = sync.apply(&current, request).await.unwrap();

        assert_eq!(result, ImageCollection::from(vec![ImageRef::new("b", "pB")]));
        assert_eq!(store.deletes(), vec!["pA".to_string()]);
    }

    #[tokio::test]
    async fn unsaved_result_discards_only_fresh_uploads() {
        let store = FakeMediaStore::new()
            .with_scripted(vec![ImageRef::new("n1", "new1"), ImageRef::new("n2", "new2")]);
        let sync = ImageSynchronizer::new(&store, ImagePolicy::PAGE);
        let previous = collection(&["old1", "old2", "old3"]);

        let request = SyncRequest::new(vec!["old1".to_string()], files(2));
        let images = sync.apply(&previous, request).await.unwrap();
        assert_eq!(store.deletes(), vec!["old1".to_string()]);

        // the save lost its race: roll back what this request uploaded
        sync.discard(&images.added_since(&previous)).await;

        let deletes = store.deletes();
        assert_eq!(deletes.len(), 3);
        let mut discarded = deletes[1..].to_vec();
        discarded.sort();
        assert_eq!(discarded, vec!["new1".to_string(), "new2".to_string()]);
        assert!(!deletes.contains(&"old2".to_string()));
        assert!(!deletes.contains(&"old3".to_string()));
    }

    #[tokio::test]
    async fn purge_deletes_every_member() {
        let store = FakeMediaStore::new();
        let sync = ImageSynchronizer::new(&store, ImagePolicy::PAGE);

        sync.purge(&collection(&["a", "b", "c"])).await;

        let mut deleted = store.deletes();
        deleted.sort();
        assert_eq!(deleted, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }
}
