//! Attache Core Library
//!
//! This crate provides the domain models, error types, configuration, folder
//! tree, and row rendering shared across all attache components. It performs
//! no I/O: the HTTP orchestration lives in `attache-client`.

pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod progress;
pub mod render;
pub mod tree;

// Re-export commonly used types
pub use config::UploadLimits;
pub use error::{extract_error_message, is_terminal_rejection, AttachError};
pub use format::human_size;
pub use models::{
    ActionResponse, AttachmentKind, AttachmentRecord, FileMeta, FolderEntry, FolderListing,
    ParentRef, StagedFile, StagedStore, UploadFile, UploadResponse,
};
pub use progress::ProgressState;
pub use render::{FolderRowView, IconUrls, RowAction, RowView};
pub use tree::{FolderTree, NodeId};
