pub mod attachment;
pub mod responses;
pub mod staged;

pub use attachment::{
    normalize_relative_path, AttachmentKind, AttachmentRecord, FileMeta, ParentRef, UploadFile,
};
pub use responses::{ActionResponse, FolderEntry, FolderListing, UploadResponse};
pub use staged::{StagedFile, StagedStore};
