use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Attachment as described by the server. The client never owns an
/// authoritative copy; it only mirrors these into the folder tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Opaque server identifier.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub is_image: bool,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub is_audio: bool,
    #[serde(default)]
    pub is_text: bool,
    /// Slash-separated path relative to the parent; empty or absent for
    /// top-level files.
    #[serde(default)]
    pub relative_path: Option<String>,
}

/// Broad attachment type used for icon selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    Text,
    Generic,
}

impl AttachmentRecord {
    /// Collapse the type flags to a single kind. Image wins over video over
    /// audio over text, matching the server's flag precedence.
    pub fn kind(&self) -> AttachmentKind {
        if self.is_image {
            AttachmentKind::Image
        } else if self.is_video {
            AttachmentKind::Video
        } else if self.is_audio {
            AttachmentKind::Audio
        } else if self.is_text {
            AttachmentKind::Text
        } else {
            AttachmentKind::Generic
        }
    }
}

/// The entity attachments hang off (e.g. an entry or a comment thread).
/// Sent as `parent_type` / `parent_id` on every mutating request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub parent_type: String,
    pub parent_id: String,
}

impl ParentRef {
    pub fn new(parent_type: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            parent_type: parent_type.into(),
            parent_id: parent_id.into(),
        }
    }
}

/// Per-file metadata mirrored to the server as `relative_paths_json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    #[serde(rename = "lastModified")]
    pub last_modified: i64,
    pub path: String,
}

/// Normalize a relative path for the wire: backslashes become slashes,
/// leading slashes are stripped, and an empty result falls back to the file
/// name so the server never sees an empty path.
pub fn normalize_relative_path(raw: &str, fallback_name: &str) -> String {
    let cleaned = raw.replace('\\', "/");
    let cleaned = cleaned.trim_start_matches('/');
    if cleaned.is_empty() {
        fallback_name.to_string()
    } else {
        cleaned.to_string()
    }
}

/// A file queued for upload: wire metadata plus content bytes.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub meta: FileMeta,
    pub content: Bytes,
    /// MIME type when known; used for staged-preview kind sniffing.
    pub content_type: Option<String>,
}

impl UploadFile {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<Bytes>,
        relative_path: Option<&str>,
        last_modified: i64,
        content_type: Option<String>,
    ) -> Self {
        let name = name.into();
        let content = content.into();
        let path = normalize_relative_path(relative_path.unwrap_or(""), &name);
        Self {
            meta: FileMeta {
                size: content.len() as u64,
                name,
                last_modified,
                path,
            },
            content,
            content_type,
        }
    }

    pub fn size(&self) -> u64 {
        self.meta.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(flags: [bool; 4]) -> AttachmentRecord {
        AttachmentRecord {
            id: "1".into(),
            name: "f".into(),
            size: 0,
            is_image: flags[0],
            is_video: flags[1],
            is_audio: flags[2],
            is_text: flags[3],
            relative_path: None,
        }
    }

    #[test]
    fn kind_precedence() {
        assert_eq!(
            record([true, true, true, true]).kind(),
            AttachmentKind::Image
        );
        assert_eq!(
            record([false, true, false, true]).kind(),
            AttachmentKind::Video
        );
        assert_eq!(
            record([false, false, false, false]).kind(),
            AttachmentKind::Generic
        );
    }

    #[test]
    fn normalize_paths() {
        assert_eq!(
            normalize_relative_path("docs\\sub\\a.txt", "a.txt"),
            "docs/sub/a.txt"
        );
        assert_eq!(normalize_relative_path("/docs/a.txt", "a.txt"), "docs/a.txt");
        assert_eq!(normalize_relative_path("", "a.txt"), "a.txt");
        assert_eq!(normalize_relative_path("///", "a.txt"), "a.txt");
    }

    #[test]
    fn upload_file_meta() {
        let f = UploadFile::new("r.pdf", vec![0u8; 10], Some("docs/r.pdf"), 42, None);
        assert_eq!(f.meta.path, "docs/r.pdf");
        assert_eq!(f.meta.size, 10);
        assert_eq!(f.meta.last_modified, 42);
        assert_eq!(f.size(), 10);
    }

    #[test]
    fn file_meta_serializes_camel_case_last_modified() {
        let meta = FileMeta {
            name: "a".into(),
            size: 1,
            last_modified: 7,
            path: "a".into(),
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"lastModified\":7"));
    }

    #[test]
    fn record_defaults_from_sparse_json() {
        let rec: AttachmentRecord = serde_json::from_str(r#"{"id":"9","name":"x"}"#).unwrap();
        assert_eq!(rec.size, 0);
        assert_eq!(rec.kind(), AttachmentKind::Generic);
        assert!(rec.relative_path.is_none());
    }
}
