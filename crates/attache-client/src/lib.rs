//! HTTP client for the attachments API.
//!
//! Provides the shared `ApiClient` (CSRF header handling, form/multipart
//! POST helpers, URL builders) plus the upload, deletion and widget
//! orchestration modules. The CLI uses this client directly.

pub mod chunk;
pub mod csrf;
pub mod delete;
pub mod upload;
pub mod widget;

use attache_core::{extract_error_message, AttachError, FolderListing, ParentRef};

use crate::csrf::CsrfToken;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// HTTP client for the attachments API. Every mutating request carries the
/// CSRF token and the `X-Requested-With` marker header; a missing token
/// fails before anything is sent.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    csrf: Option<CsrfToken>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, csrf: Option<CsrfToken>) -> Result<Self, AttachError> {
        // No per-request timeout: retry budget and backoff bound total latency.
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AttachError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            csrf,
        })
    }

    /// Create a client from environment: ATTACHE_API_URL (or API_URL), and
    /// ATTACHE_CSRF_TOKEN or a raw Cookie header in ATTACHE_COOKIE.
    pub fn from_env() -> Result<Self, AttachError> {
        let base_url = std::env::var("ATTACHE_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let csrf = std::env::var("ATTACHE_CSRF_TOKEN")
            .ok()
            .and_then(CsrfToken::new)
            .or_else(|| {
                std::env::var("ATTACHE_COOKIE")
                    .ok()
                    .and_then(|cookie| CsrfToken::from_cookie_header(&cookie))
            });

        Self::new(base_url, csrf)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Preview page for an attachment (navigational, not fetched).
    pub fn preview_url(&self, id: &str) -> String {
        self.build_url(&format!("/attachments/preview/{}/", id))
    }

    /// Download link for an attachment (navigational, not fetched).
    pub fn download_url(&self, id: &str) -> String {
        self.build_url(&format!("/attachments/download/{}/", id))
    }

    /// Download link for a whole folder (navigational, not fetched).
    pub fn download_folder_url(&self, parent: &ParentRef, folder_path: &str) -> String {
        self.build_url(&format!(
            "/attachments/download_folder/?parent_type={}&parent_id={}&folder_path={}",
            urlencoding::encode(&parent.parent_type),
            urlencoding::encode(&parent.parent_id),
            urlencoding::encode(folder_path),
        ))
    }

    pub(crate) fn require_csrf(&self) -> Result<&CsrfToken, AttachError> {
        self.csrf.as_ref().ok_or(AttachError::MissingCsrf)
    }

    /// POST request builder with the mandatory mutating-request headers.
    pub(crate) fn post(&self, path: &str) -> Result<reqwest::RequestBuilder, AttachError> {
        let csrf = self.require_csrf()?;
        Ok(self
            .client
            .post(self.build_url(path))
            .header("X-CSRFToken", csrf.as_str())
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Accept", "application/json"))
    }

    /// POST an empty-bodied request; returns status and body text.
    pub(crate) async fn post_empty(&self, path: &str) -> Result<(u16, String), AttachError> {
        let response = self
            .post(path)?
            .send()
            .await
            .map_err(|e| AttachError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        Ok((status, text))
    }

    /// POST form fields as multipart (the shape the endpoints consume);
    /// returns status and body text.
    pub(crate) async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<(u16, String), AttachError> {
        let form = fields.iter().fold(
            reqwest::multipart::Form::new(),
            |form, (name, value)| form.text(name.to_string(), value.to_string()),
        );
        let response = self
            .post(path)?
            .multipart(form)
            .send()
            .await
            .map_err(|e| AttachError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        Ok((status, text))
    }

    /// Fetch one folder's children for lazy tree expansion.
    pub async fn list_folder(
        &self,
        parent: &ParentRef,
        folder_path: &str,
        session: Option<&str>,
    ) -> Result<FolderListing, AttachError> {
        let mut fields = vec![
            ("parent_type", parent.parent_type.as_str()),
            ("parent_id", parent.parent_id.as_str()),
            ("folder_path", folder_path),
        ];
        if let Some(session) = session {
            fields.push(("upload_session", session));
        }

        let (status, text) = self.post_form("/attachments/list_folder/", &fields).await?;
        if !(200..300).contains(&status) {
            return Err(AttachError::Server(extract_error_message(&text, status)));
        }
        let listing: FolderListing =
            serde_json::from_str(&text).map_err(|_| AttachError::Parse(text.clone()))?;
        if !listing.ok {
            return Err(AttachError::Server(
                listing
                    .error
                    .unwrap_or_else(|| "failed to load folder content".to_string()),
            ));
        }
        Ok(listing)
    }

    /// Raw client for custom requests.
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://example.test/", CsrfToken::new("tok")).unwrap()
    }

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(client().base_url(), "http://example.test");
        assert_eq!(
            client().build_url("/attachments/upload/"),
            "http://example.test/attachments/upload/"
        );
    }

    #[test]
    fn navigational_urls() {
        let c = client();
        assert_eq!(
            c.preview_url("42"),
            "http://example.test/attachments/preview/42/"
        );
        assert_eq!(
            c.download_url("42"),
            "http://example.test/attachments/download/42/"
        );
        let parent = ParentRef::new("entry", "7");
        assert_eq!(
            c.download_folder_url(&parent, "docs/a b"),
            "http://example.test/attachments/download_folder/?parent_type=entry&parent_id=7&folder_path=docs%2Fa%20b"
        );
    }

    #[test]
    fn missing_csrf_fails_before_any_request() {
        let c = ApiClient::new("http://example.test", None).unwrap();
        let err = c.post("/attachments/upload/").unwrap_err();
        assert!(matches!(err, AttachError::MissingCsrf));
    }
}
