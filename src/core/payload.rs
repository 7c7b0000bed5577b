//! Upload payload normalization.
//!
//! [`normalize`] resolves any [`FileInput`] into one contiguous buffer ready
//! to attach as the `file` field of a multipart form, or passes a URL through
//! untouched for service-side fetching.

use crate::core::error::{WebAvError, WebAvResult};
use crate::core::input::{ByteStream, FileInput};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;

/// A transport-ready upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPayload {
    /// File bytes for a multipart upload.
    Multipart {
        /// The complete file content.
        data: Bytes,
        /// Name sent with the `file` part.
        file_name: String,
        /// Declared content type of the `file` part.
        media_type: Option<String>,
    },

    /// A URL submitted as the `file_url` JSON field.
    RemoteUrl(String),
}

impl UploadPayload {
    /// Returns the number of bytes to upload, or zero for URL submissions.
    pub fn len(&self) -> usize {
        match self {
            Self::Multipart { data, .. } => data.len(),
            Self::RemoteUrl(_) => 0,
        }
    }

    /// Returns `true` if there are no bytes to upload.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for URL submissions.
    pub fn is_remote_url(&self) -> bool {
        matches!(self, Self::RemoteUrl(_))
    }
}

/// Resolves a file input into an upload payload.
///
/// Arguments are validated before anything is read, so a rejected call
/// leaves a stream input unconsumed.
///
/// # Errors
///
/// - `InvalidArgument` for an empty file name, a malformed media type, or
///   text that is not valid base64.
/// - `Stream` if the byte stream or file fails while being read.
pub async fn normalize(input: FileInput, file_name: &str) -> WebAvResult<UploadPayload> {
    if !input.is_remote_url() {
        if file_name.trim().is_empty() {
            return Err(WebAvError::invalid_argument("file name must not be empty"));
        }
        if let Some(media_type) = input.media_type() {
            validate_media_type(media_type)?;
        }
    }

    let (data, media_type) = match input {
        FileInput::Base64Text { text, media_type } => (decode_base64(&text)?, media_type),
        FileInput::RawBytes { data, media_type } => (data, media_type),
        FileInput::ByteStream { stream, media_type } => (drain(stream).await?, media_type),
        FileInput::FilePath { path, media_type } => {
            (Bytes::from(tokio::fs::read(&path).await?), media_type)
        }
        FileInput::RemoteUrl(url) => return Ok(UploadPayload::RemoteUrl(url)),
    };

    tracing::debug!(file_name, bytes = data.len(), "Normalized upload payload");

    Ok(UploadPayload::Multipart {
        data,
        file_name: file_name.to_string(),
        media_type,
    })
}

/// Decodes standard base64, ignoring embedded whitespace and line breaks.
pub fn decode_base64(text: &str) -> WebAvResult<Bytes> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map(Bytes::from)
        .map_err(|e| WebAvError::invalid_argument(format!("file content is not valid base64: {e}")))
}

/// Concatenates every chunk of the stream in arrival order.
async fn drain(stream: ByteStream) -> WebAvResult<Bytes> {
    let buffer = stream
        .try_fold(BytesMut::new(), |mut buffer, chunk| async move {
            buffer.extend_from_slice(&chunk);
            Ok(buffer)
        })
        .await?;
    Ok(buffer.freeze())
}

/// Checks that a media type has the `type/subtype` shape, with optional
/// `;`-separated parameters.
pub fn validate_media_type(media_type: &str) -> WebAvResult<()> {
    let essence = media_type.split(';').next().unwrap_or_default().trim();
    let valid = match essence.split_once('/') {
        Some((kind, subtype)) => is_token(kind) && is_token(subtype),
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(WebAvError::invalid_argument(format!(
            "invalid media type: '{media_type}'"
        )))
    }
}

fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
}
