//! HTTP upload backend.
//!
//! Async client using `reqwest`: JSON for the existence check and merge,
//! `multipart/form-data` for chunks.

use std::time::Duration;

use chunkup_protocol::constants::{self, fields};
use chunkup_protocol::{CheckRequest, CheckResponse, MergeRequest, MergeResponse};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::debug;

use crate::backend::{BackendFuture, ChunkUpload, UploadBackend};
use crate::error::UploadError;

/// Where and how to reach the upload server.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpBackendConfig {
    /// Scheme and authority, e.g. `https://files.example.com`.
    pub base_url: String,
    pub check_path: String,
    pub chunk_path: String,
    pub merge_path: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Sent as `Authorization: Bearer <token>` when set.
    pub auth_token: Option<String>,
}

impl HttpBackendConfig {
    /// Config with default endpoint paths for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            check_path: constants::CHECK_PATH.to_string(),
            chunk_path: constants::CHUNK_PATH.to_string(),
            merge_path: constants::MERGE_PATH.to_string(),
            timeout: constants::DEFAULT_REQUEST_TIMEOUT,
            auth_token: None,
        }
    }
}

/// Upload server reached over HTTP.
pub struct HttpBackend {
    http: reqwest::Client,
    check_url: String,
    chunk_url: String,
    merge_url: String,
}

impl HttpBackend {
    /// Creates a client for the given server.
    pub fn new(config: HttpBackendConfig) -> Result<Self, UploadError> {
        let base = config.base_url.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(UploadError::Config(format!(
                "base URL must start with http:// or https://: {}",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = config.auth_token.as_deref().filter(|t| !t.is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| UploadError::Config("invalid auth token".into()))?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            check_url: join_url(base, &config.check_path),
            chunk_url: join_url(base, &config.chunk_path),
            merge_url: join_url(base, &config.merge_path),
        })
    }

    /// POSTs `body` as JSON and returns the raw response body.
    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Vec<u8>, UploadError> {
        let resp = self.http.post(url).json(body).send().await?;
        read_success(resp).await
    }
}

impl UploadBackend for HttpBackend {
    fn check_exists<'a>(&'a self, req: &'a CheckRequest) -> BackendFuture<'a, CheckResponse> {
        Box::pin(async move {
            let body = self.post_json(&self.check_url, req).await?;
            let resp: CheckResponse = serde_json::from_slice(&body)?;
            debug!(hash = %req.file_hash, uploaded = resp.uploaded, "existence check");
            Ok(resp)
        })
    }

    fn upload_chunk<'a>(&'a self, upload: ChunkUpload<'a>) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            // `Bytes` clones share the buffer; the chunk is not copied.
            let body = reqwest::Body::from(upload.chunk.data.clone());
            let part = Part::stream_with_length(body, upload.chunk.size())
                .file_name(upload.id())
                .mime_str("application/octet-stream")?;

            let form = upload
                .text_fields()
                .into_iter()
                .fold(Form::new().part(fields::CHUNK, part), |form, (name, value)| {
                    form.text(name, value)
                });

            let resp = self.http.post(&self.chunk_url).multipart(form).send().await?;
            read_success(resp).await?;
            Ok(())
        })
    }

    fn merge<'a>(&'a self, req: &'a MergeRequest) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let body = self.post_json(&self.merge_url, req).await?;
            // The acknowledgement body is informational only.
            if let Ok(resp) = serde_json::from_slice::<MergeResponse>(&body) {
                debug!(hash = %req.file_hash, message = ?resp.message, "merge acknowledged");
            }
            Ok(())
        })
    }
}

/// Maps non-2xx statuses to [`UploadError::Api`].
async fn read_success(resp: reqwest::Response) -> Result<Vec<u8>, UploadError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(UploadError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.bytes().await?.to_vec())
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
