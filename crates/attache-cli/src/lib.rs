use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use attache_core::models::UploadFile;

/// Collect upload files from a mix of file and directory paths. Directories
/// recurse depth-first in name order; relative paths keep the selected
/// directory's own name as the first segment, the way folder inputs report
/// them.
pub fn collect_upload_files(paths: &[PathBuf]) -> Result<Vec<UploadFile>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let root = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .with_context(|| format!("Invalid directory name: {}", path.display()))?;
            collect_dir(path, &root, &mut files)?;
        } else {
            files.push(read_one(path, None)?);
        }
    }
    Ok(files)
}

fn collect_dir(dir: &Path, prefix: &str, out: &mut Vec<UploadFile>) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = format!("{}/{}", prefix, name);
        if path.is_dir() {
            collect_dir(&path, &relative, out)?;
        } else {
            out.push(read_one(&path, Some(&relative))?);
        }
    }
    Ok(())
}

fn read_one(path: &Path, relative: Option<&str>) -> Result<UploadFile> {
    let content =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string();
    let modified_ms = fs::metadata(path)
        .ok()
        .and_then(|meta| meta.modified().ok())
        .map(|time| chrono::DateTime::<chrono::Utc>::from(time).timestamp_millis())
        .unwrap_or(0);
    let content_type = guess_content_type(&name);
    Ok(UploadFile::new(name, content, relative, modified_ms, content_type))
}

/// Best-effort MIME type from the file extension; only drives icon
/// selection for staged previews.
pub fn guess_content_type(name: &str) -> Option<String> {
    let extension = name.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "txt" | "md" | "log" => "text/plain",
        "html" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "json" => "application/json",
        "xml" => "application/xml",
        "js" => "application/javascript",
        _ => return None,
    };
    Some(mime.to_string())
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn guesses_common_types() {
        assert_eq!(guess_content_type("a.PNG").as_deref(), Some("image/png"));
        assert_eq!(guess_content_type("b.json").as_deref(), Some("application/json"));
        assert_eq!(guess_content_type("noext"), None);
        assert_eq!(guess_content_type("c.zzz"), None);
    }

    #[test]
    fn collects_single_files_without_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, b"hello").unwrap();

        let files = collect_upload_files(&[file]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].meta.name, "plain.txt");
        // falls back to the name, never empty
        assert_eq!(files[0].meta.path, "plain.txt");
        assert_eq!(files[0].meta.size, 5);
    }

    #[test]
    fn directory_walk_keeps_root_name_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("docs");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("b.txt"), b"b").unwrap();
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::write(root.join("sub").join("inner.md"), b"in").unwrap();

        let files = collect_upload_files(&[root]).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.meta.path.as_str()).collect();
        assert_eq!(paths, vec!["docs/a.txt", "docs/b.txt", "docs/sub/inner.md"]);
    }
}
