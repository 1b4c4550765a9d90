//! Remotely-hosted images: the media store seam, the Cloudinary client and the
//! synchronizer that keeps a document's bounded image set consistent with it.

pub mod cloudinary;
pub mod image;
pub mod store;
pub mod sync;

pub use cloudinary::CloudinaryStore;
pub use image::{ImageCollection, ImagePolicy, ImageRef, UploadFile};
pub use store::{MediaError, MediaStore};
pub use sync::{ImageSynchronizer, SyncError, SyncRequest};
