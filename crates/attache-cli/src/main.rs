//! attache CLI: command-line client for the attachments API.
//!
//! Set ATTACHE_API_URL (or API_URL) and ATTACHE_CSRF_TOKEN (or a raw Cookie
//! header in ATTACHE_COOKIE).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use attache_cli::{collect_upload_files, init_tracing};
use attache_client::delete::{AlwaysConfirm, ConfirmPrompt};
use attache_client::upload::{UploadEvent, UploadObserver};
use attache_client::widget::{WidgetConfig, WidgetController};
use attache_client::ApiClient;
use attache_core::render::{render_tree, TreeRow};
use attache_core::{FolderTree, IconUrls, NodeId, ParentRef};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "attache", about = "Attachments API CLI")]
struct Cli {
    /// Parent entity type the attachments hang off
    #[arg(long, global = true, default_value = "entry")]
    parent_type: String,
    /// Parent entity id
    #[arg(long, global = true, default_value = "")]
    parent_id: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files or directories (directories keep their structure)
    Upload {
        /// Files or directories to upload
        paths: Vec<PathBuf>,
        /// Stage the selection instead of uploading (prints the staged rows)
        #[arg(long)]
        staged: bool,
    },
    /// List one folder's children
    ListFolder {
        /// Accumulated folder path; empty for the top level
        #[arg(default_value = "")]
        folder_path: String,
    },
    /// Print the whole attachment tree with human-readable sizes
    Tree,
    /// Delete an attachment by id
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Delete a folder and all of its files
    DeleteFolder {
        folder_path: String,
        #[arg(long)]
        yes: bool,
    },
    /// Delete a comment by id
    DeleteComment {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Print navigational URLs (preview, download, folder download)
    Urls {
        /// Attachment id
        #[arg(long)]
        id: Option<String>,
        /// Folder path for a folder download link
        #[arg(long)]
        folder_path: Option<String>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Asks on stderr and reads one line from stdin.
struct StdinConfirm;

impl ConfirmPrompt for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        eprint!("{} [y/N] ", message);
        let _ = io::stderr().flush();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim(), "y" | "Y" | "yes")
    }
}

fn confirm_for(yes: bool) -> Box<dyn ConfirmPrompt> {
    if yes {
        Box::new(AlwaysConfirm)
    } else {
        Box::new(StdinConfirm)
    }
}

fn progress_observer() -> UploadObserver {
    Arc::new(|event| match event {
        UploadEvent::Started { total_bytes } => {
            tracing::info!(total_bytes, "upload started");
        }
        UploadEvent::Progress { percent } => {
            tracing::debug!(percent, "upload progress");
        }
        UploadEvent::Finished => {
            tracing::info!("upload finished");
        }
        UploadEvent::Failed { message } => {
            tracing::error!(error = %message, "upload failed");
        }
        UploadEvent::SessionSet { session } => {
            tracing::debug!(%session, "upload session created");
        }
    })
}

/// Walk the remote folder structure breadth-first into a local tree.
async fn build_remote_tree(
    client: &ApiClient,
    parent: &ParentRef,
) -> anyhow::Result<FolderTree> {
    let mut tree = FolderTree::new();
    let mut queue: Vec<(NodeId, String)> = vec![(FolderTree::ROOT, String::new())];
    while let Some((node, path)) = queue.pop() {
        let listing = client
            .list_folder(parent, &path, None)
            .await
            .with_context(|| format!("Failed to list folder '{}'", path))?;
        for folder in listing.folders {
            let child = tree.add_folder(node, &folder.name, Some(&folder.path));
            tree.set_collapsed(child, false);
            queue.push((child, folder.path));
        }
        for file in listing.files {
            tree.add_file(node, file);
        }
        tree.mark_loaded(node);
    }
    Ok(tree)
}

fn print_tree(tree: &FolderTree) {
    let icons = IconUrls::new();
    for (depth, row) in render_tree(tree, FolderTree::ROOT, false, &icons) {
        let indent = "  ".repeat(depth);
        match row {
            TreeRow::File(file) => println!("{}{} ({})", indent, file.name, file.size_label),
            TreeRow::Folder(folder) => println!("{}{}/", indent, folder.name),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let client = ApiClient::from_env()
        .context("Failed to create API client. Set ATTACHE_API_URL (or API_URL)")?;

    let cli = Cli::parse();
    let parent = ParentRef::new(cli.parent_type.clone(), cli.parent_id.clone());

    match cli.command {
        Commands::Upload { paths, staged } => {
            if paths.is_empty() {
                anyhow::bail!("Nothing to upload: pass at least one file or directory");
            }
            let files = collect_upload_files(&paths)?;
            let mut config = WidgetConfig::new(parent);
            config.no_async = staged;
            let mut widget = WidgetController::new(client, config);
            widget.set_observer(progress_observer());

            let records = widget.ingest_selection(files).await?;
            if staged && records.is_empty() {
                let rows: Vec<_> = widget
                    .staged_rows()
                    .into_iter()
                    .map(|row| {
                        serde_json::json!({
                            "id": row.id,
                            "name": row.name,
                            "size": row.size,
                            "relative_path": row.relative_path,
                        })
                    })
                    .collect();
                print_json(&rows)?;
            } else {
                print_json(&records)?;
            }
        }
        Commands::ListFolder { folder_path } => {
            let listing = client.list_folder(&parent, &folder_path, None).await?;
            print_json(&listing)?;
        }
        Commands::Tree => {
            let tree = build_remote_tree(&client, &parent).await?;
            print_tree(&tree);
        }
        Commands::Delete { id, yes } => {
            let mut widget = WidgetController::new(client, WidgetConfig::new(parent));
            let deleted = widget.delete_attachment(&id, confirm_for(yes).as_ref()).await?;
            print_json(&serde_json::json!({ "ok": deleted, "id": id }))?;
        }
        Commands::DeleteFolder { folder_path, yes } => {
            let mut widget = WidgetController::new(client, WidgetConfig::new(parent));
            // materialize the node so success prunes a consistent local tree
            let node = widget.seed_folder(&folder_path);
            let deleted = widget.delete_folder(node, confirm_for(yes).as_ref()).await?;
            print_json(&serde_json::json!({ "ok": deleted, "folder_path": folder_path }))?;
        }
        Commands::DeleteComment { id, yes } => {
            let mut widget = WidgetController::new(client, WidgetConfig::new(parent));
            let deleted = widget.delete_comment(&id, confirm_for(yes).as_ref()).await?;
            print_json(&serde_json::json!({ "ok": deleted, "id": id }))?;
        }
        Commands::Urls { id, folder_path } => {
            let mut urls = serde_json::Map::new();
            if let Some(id) = &id {
                urls.insert(
                    "preview".to_string(),
                    serde_json::Value::String(client.preview_url(id)),
                );
                urls.insert(
                    "download".to_string(),
                    serde_json::Value::String(client.download_url(id)),
                );
            }
            if let Some(folder_path) = &folder_path {
                urls.insert(
                    "download_folder".to_string(),
                    serde_json::Value::String(client.download_folder_url(&parent, folder_path)),
                );
            }
            if urls.is_empty() {
                anyhow::bail!("Pass --id and/or --folder-path");
            }
            print_json(&serde_json::Value::Object(urls))?;
        }
    }

    Ok(())
}
