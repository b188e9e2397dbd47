//! Wire response shapes for the attachment endpoints.

use serde::{Deserialize, Serialize};

use super::attachment::AttachmentRecord;

/// `POST /attachments/upload/` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub ok: bool,
    #[serde(default)]
    pub files: Vec<AttachmentRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A folder as returned by the listing endpoint: display name plus
/// accumulated path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderEntry {
    pub name: String,
    pub path: String,
}

/// `POST /attachments/list_folder/` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderListing {
    pub ok: bool,
    #[serde(default)]
    pub folders: Vec<FolderEntry>,
    #[serde(default)]
    pub files: Vec<AttachmentRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Minimal `{ok, error?}` response used by folder deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}
