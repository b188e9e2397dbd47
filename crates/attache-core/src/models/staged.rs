//! Staged (selected but not yet uploaded) files.
//!
//! Containers that opt out of immediate upload keep selections client-side
//! until the form is submitted; staged rows carry synthetic ids so they can
//! never be confused with server records.

use uuid::Uuid;

use super::attachment::{AttachmentKind, UploadFile};

const STAGED_PREFIX: &str = "staged-";

/// Display placeholder for a file that has not been sent yet.
#[derive(Debug, Clone)]
pub struct StagedFile {
    /// Synthetic id, `staged-` prefixed.
    pub id: String,
    pub name: String,
    pub size: u64,
    pub kind: AttachmentKind,
    pub relative_path: String,
}

impl StagedFile {
    pub fn from_upload(file: &UploadFile) -> Self {
        Self {
            id: format!("{}{}", STAGED_PREFIX, Uuid::new_v4().simple()),
            name: file.meta.name.clone(),
            size: file.meta.size,
            kind: sniff_kind(file.content_type.as_deref().unwrap_or("")),
            relative_path: file.meta.path.clone(),
        }
    }

    pub fn is_staged_id(id: &str) -> bool {
        id.starts_with(STAGED_PREFIX)
    }
}

/// Map a MIME type to a display kind, mirroring the preview sniffing rules:
/// `image/*`, `video/*`, `audio/*`, then text-ish application types.
pub fn sniff_kind(content_type: &str) -> AttachmentKind {
    if content_type.starts_with("image/") {
        AttachmentKind::Image
    } else if content_type.starts_with("video/") {
        AttachmentKind::Video
    } else if content_type.starts_with("audio/") {
        AttachmentKind::Audio
    } else if content_type.starts_with("text")
        || matches!(
            content_type,
            "application/json"
                | "application/xml"
                | "application/javascript"
                | "application/x-www-form-urlencoded"
        )
    {
        AttachmentKind::Text
    } else {
        AttachmentKind::Generic
    }
}

/// The pending selection of a widget: staged rows plus the files backing
/// them, removable by name and size (the only keys a file input exposes
/// reliably across browsers).
#[derive(Debug, Default)]
pub struct StagedStore {
    entries: Vec<(StagedFile, UploadFile)>,
}

impl StagedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a file and return its display row.
    pub fn stage(&mut self, file: UploadFile) -> StagedFile {
        let row = StagedFile::from_upload(&file);
        self.entries.push((row.clone(), file));
        row
    }

    /// Remove every staged file matching name and size. Returns whether
    /// anything was removed.
    pub fn remove(&mut self, name: &str, size: u64) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|(row, _)| !(row.name == name && row.size == size));
        self.entries.len() != before
    }

    /// Take all pending files for submission, leaving the store empty.
    pub fn drain(&mut self) -> Vec<UploadFile> {
        self.entries.drain(..).map(|(_, file)| file).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = &StagedFile> {
        self.entries.iter().map(|(row, _)| row)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, size: usize, content_type: &str) -> UploadFile {
        UploadFile::new(
            name,
            vec![0u8; size],
            None,
            0,
            Some(content_type.to_string()),
        )
    }

    #[test]
    fn staged_ids_are_prefixed_and_unique() {
        let a = StagedFile::from_upload(&upload("a.png", 4, "image/png"));
        let b = StagedFile::from_upload(&upload("a.png", 4, "image/png"));
        assert!(StagedFile::is_staged_id(&a.id));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn sniffing_rules() {
        assert_eq!(sniff_kind("image/jpeg"), AttachmentKind::Image);
        assert_eq!(sniff_kind("video/mp4"), AttachmentKind::Video);
        assert_eq!(sniff_kind("audio/ogg"), AttachmentKind::Audio);
        assert_eq!(sniff_kind("text/plain"), AttachmentKind::Text);
        assert_eq!(sniff_kind("application/json"), AttachmentKind::Text);
        assert_eq!(sniff_kind("application/pdf"), AttachmentKind::Generic);
        assert_eq!(sniff_kind(""), AttachmentKind::Generic);
    }

    #[test]
    fn remove_matches_name_and_size() {
        let mut store = StagedStore::new();
        store.stage(upload("a.txt", 3, "text/plain"));
        store.stage(upload("a.txt", 5, "text/plain"));
        store.stage(upload("b.txt", 3, "text/plain"));

        assert!(store.remove("a.txt", 3));
        assert_eq!(store.len(), 2);
        // size mismatch removes nothing
        assert!(!store.remove("b.txt", 99));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn drain_empties_the_store_in_order() {
        let mut store = StagedStore::new();
        store.stage(upload("a.txt", 1, "text/plain"));
        store.stage(upload("b.txt", 2, "text/plain"));

        let files = store.drain();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].meta.name, "a.txt");
        assert_eq!(files[1].meta.name, "b.txt");
        assert!(store.is_empty());
    }
}
