//! Deletion flows: single attachments, folders (recursive on the server),
//! and comments.

use attache_core::{extract_error_message, ActionResponse, AttachError, ParentRef};

use crate::ApiClient;

/// User-confirmation seam; every deletion asks before any network call.
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str) -> bool;
}

/// Confirms everything. For non-interactive callers and tests.
pub struct AlwaysConfirm;

impl ConfirmPrompt for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

pub struct DeletionController<'a> {
    client: &'a ApiClient,
}

impl<'a> DeletionController<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Delete one attachment by id. Non-success surfaces the server's
    /// `{error|message}` field or raw body text.
    pub async fn delete_attachment(&self, id: &str) -> Result<(), AttachError> {
        let (status, text) = self
            .client
            .post_empty(&format!("/attachments/delete/{}/", id))
            .await?;
        if !(200..300).contains(&status) {
            return Err(AttachError::Server(extract_error_message(&text, status)));
        }
        Ok(())
    }

    /// Delete a folder and all of its descendant files (the server handles
    /// recursion). Success/failure is decided by the body's `ok` flag.
    pub async fn delete_folder(
        &self,
        parent: &ParentRef,
        folder_path: &str,
    ) -> Result<(), AttachError> {
        let fields = [
            ("parent_type", parent.parent_type.as_str()),
            ("parent_id", parent.parent_id.as_str()),
            ("folder_path", folder_path),
        ];
        let (_, text) = self
            .client
            .post_form("/attachments/delete_folder/", &fields)
            .await?;

        let response = serde_json::from_str::<ActionResponse>(&text).unwrap_or_else(|_| {
            ActionResponse {
                ok: false,
                error: Some(text.clone()),
            }
        });
        if !response.ok {
            return Err(AttachError::Server(
                response.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }

    /// Delete one comment by id.
    pub async fn delete_comment(&self, id: &str) -> Result<(), AttachError> {
        let (status, text) = self
            .client
            .post_empty(&format!("/comments/{}/delete/", urlencoding::encode(id)))
            .await?;
        if !(200..300).contains(&status) {
            return Err(AttachError::Server(extract_error_message(&text, status)));
        }
        Ok(())
    }
}
