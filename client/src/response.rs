//! Buffered request bodies and responses.
//!
//! Bodies are buffered on both sides: a request must be replayable for the
//! token-refresh retry, and a response body must be inspected for the
//! stale-token signature before it is handed back to the caller.

use desk_types::{DataEnvelope, Envelope};
use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::DeskError;

/// Hard cap on a buffered response body.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// A request body that can be rebuilt for every attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartBody),
}

/// Multipart form contents. `reqwest::multipart::Form` is single-use, so the
/// parts are kept here and a fresh form is encoded per attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartBody {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            field: "file".to_string(),
            file_name: file_name.into(),
            mime: None,
            bytes,
        }
    }

    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

impl MultipartBody {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn file(mut self, file: FilePart) -> Self {
        self.files.push(file);
        self
    }

    pub(crate) fn to_form(&self) -> Result<Form, DeskError> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for file in &self.files {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            if let Some(mime) = &file.mime {
                part = part
                    .mime_str(mime)
                    .map_err(|_| {
                        DeskError::InvalidArgument(format!("invalid MIME type `{mime}`"))
                    })?;
            }
            form = form.part(file.field.clone(), part);
        }
        Ok(form)
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, DeskError> {
        let status = response.status();
        let headers = response.headers().clone();

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > MAX_BODY_BYTES {
                return Err(DeskError::BodyTooLarge {
                    limit: MAX_BODY_BYTES,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(Self::new(status, headers, body))
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Pass 2xx responses through; turn anything else into [`DeskError::Api`].
    pub fn error_for_status(self, fallback: &str) -> Result<Self, DeskError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(DeskError::from_response(&self, fallback))
        }
    }

    pub fn json<T: DeserializeOwned>(&self, context: &str) -> Result<T, DeskError> {
        serde_json::from_slice(&self.body).map_err(|source| DeskError::Decode {
            context: context.to_string(),
            source,
        })
    }

    /// Payload of a `{"message": ...}` envelope.
    pub fn message<T: DeserializeOwned>(&self, context: &str) -> Result<T, DeskError> {
        self.json::<Envelope<T>>(context).map(|envelope| envelope.message)
    }

    /// Payload of a `{"data": ...}` envelope.
    pub fn data<T: DeserializeOwned>(&self, context: &str) -> Result<T, DeskError> {
        self.json::<DataEnvelope<T>>(context).map(|envelope| envelope.data)
    }
}
