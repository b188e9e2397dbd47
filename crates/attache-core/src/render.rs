//! Row projection for attachment and folder display.
//!
//! Converts records, staged files and folder nodes into plain view structs a
//! host UI can render directly. Icon URLs resolve through an optional
//! hashed-asset map (manifest builds rename static files) with a
//! conventional fallback path for development.

use std::collections::HashMap;

use crate::format::human_size;
use crate::models::{AttachmentKind, AttachmentRecord, StagedFile};
use crate::tree::{FolderNode, FolderTree, NodeId};

/// Hashed static-asset map keyed by icon slug (`file_image`, `folder`, ...).
#[derive(Debug, Default, Clone)]
pub struct IconUrls {
    map: HashMap<String, String>,
}

impl IconUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    /// Resolve an icon slug to a URL, falling back to the unhashed static
    /// path when no map entry exists.
    pub fn resolve(&self, slug: &str) -> String {
        if let Some(url) = self.map.get(slug) {
            return url.clone();
        }
        format!("/static/img/icons/{}.svg", slug.replace('_', "-"))
    }
}

fn icon_slug(kind: AttachmentKind) -> &'static str {
    match kind {
        AttachmentKind::Image => "file_image",
        AttachmentKind::Video => "file_play",
        AttachmentKind::Audio => "file_music",
        AttachmentKind::Text => "file_text",
        AttachmentKind::Generic => "file_earmark",
    }
}

/// The action control rendered at the end of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    /// Editable context: delete the server record.
    Delete { id: String },
    /// Read-only context: link to the download endpoint.
    Download { href: String },
    /// Staged row: remove from the pending selection.
    Remove { name: String, size: u64 },
}

/// One attachment row.
#[derive(Debug, Clone)]
pub struct RowView {
    pub id: String,
    pub icon_url: String,
    pub name: String,
    /// Preview link; staged rows have none (no server id yet).
    pub href: Option<String>,
    pub size_label: String,
    pub action: RowAction,
    pub staged: bool,
}

/// One folder row with its caret state.
#[derive(Debug, Clone)]
pub struct FolderRowView {
    pub name: String,
    pub path: String,
    pub caret_url: String,
    pub icon_url: String,
    pub meta_label: &'static str,
    pub collapsed: bool,
    /// Present only in editable contexts; carries the accumulated path the
    /// delete request needs.
    pub delete_path: Option<String>,
}

/// Project a server record into a display row.
pub fn render_attachment(record: &AttachmentRecord, can_edit: bool, icons: &IconUrls) -> RowView {
    let action = if can_edit {
        RowAction::Delete {
            id: record.id.clone(),
        }
    } else {
        RowAction::Download {
            href: format!("/attachments/download/{}/", record.id),
        }
    };
    RowView {
        id: record.id.clone(),
        icon_url: icons.resolve(icon_slug(record.kind())),
        name: record.name.clone(),
        href: Some(format!("/attachments/preview/{}/", record.id)),
        size_label: human_size(record.size),
        action,
        staged: false,
    }
}

/// Project a staged file: no preview link, remove action instead of delete.
pub fn render_staged(staged: &StagedFile, icons: &IconUrls) -> RowView {
    RowView {
        id: staged.id.clone(),
        icon_url: icons.resolve(icon_slug(staged.kind)),
        name: staged.name.clone(),
        href: None,
        size_label: human_size(staged.size),
        action: RowAction::Remove {
            name: staged.name.clone(),
            size: staged.size,
        },
        staged: true,
    }
}

/// Project a folder node into its row.
pub fn render_folder(node: &FolderNode, can_edit: bool, icons: &IconUrls) -> FolderRowView {
    let caret = if node.collapsed {
        "caret_right"
    } else {
        "caret_down"
    };
    FolderRowView {
        name: node.name.clone(),
        path: node.accumulated_path.clone(),
        caret_url: icons.resolve(caret),
        icon_url: icons.resolve("folder"),
        meta_label: "folder",
        collapsed: node.collapsed,
        delete_path: can_edit.then(|| node.accumulated_path.clone()),
    }
}

/// Project a whole subtree as indented lines, depth-first. Files precede
/// any trailing input control the host appends, so rows are emitted in tree
/// order with folders after their own files.
pub fn render_tree(
    tree: &FolderTree,
    root: NodeId,
    can_edit: bool,
    icons: &IconUrls,
) -> Vec<(usize, TreeRow)> {
    let mut out = Vec::new();
    fn walk(
        tree: &FolderTree,
        id: NodeId,
        depth: usize,
        can_edit: bool,
        icons: &IconUrls,
        out: &mut Vec<(usize, TreeRow)>,
    ) {
        for record in tree.files(id) {
            out.push((depth, TreeRow::File(render_attachment(record, can_edit, icons))));
        }
        for child in tree.children(id) {
            out.push((
                depth,
                TreeRow::Folder(render_folder(tree.node(*child), can_edit, icons)),
            ));
            walk(tree, *child, depth + 1, can_edit, icons, out);
        }
    }
    walk(tree, root, 0, can_edit, icons, &mut out);
    out
}

/// A rendered line in the tree projection.
#[derive(Debug, Clone)]
pub enum TreeRow {
    File(RowView),
    Folder(FolderRowView),
}
