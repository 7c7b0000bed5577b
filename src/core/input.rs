//! File input abstraction for uploads.
//!
//! `FileInput` lists every representation a caller may hand to
//! [`WebAv::scan_by_upload`](crate::client::WebAv::scan_by_upload): base64
//! text, raw bytes, a byte stream, a path on disk, or a URL the service
//! should fetch itself.

use std::fmt;
use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// A stream of byte chunks, drained once by the normalizer.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Flexible file input for uploads.
///
/// Each variant except `RemoteUrl` may carry a declared media type, sent
/// as the content type of the multipart `file` field.
///
/// # Examples
///
/// ```rust
/// use webav::core::FileInput;
///
/// let input = FileInput::from_base64("SGVsbG8=");
/// let input = FileInput::from_bytes(vec![0x25u8, 0x50, 0x44, 0x46])
///     .with_media_type("application/pdf");
/// let input = FileInput::from_url("https://example.com/report.pdf");
/// ```
pub enum FileInput {
    /// Base64-encoded file content.
    Base64Text {
        /// The encoded text.
        text: String,
        /// Optional declared media type.
        media_type: Option<String>,
    },

    /// Raw file content.
    RawBytes {
        /// The file data.
        data: Bytes,
        /// Optional declared media type.
        media_type: Option<String>,
    },

    /// A one-shot stream of chunks, concatenated in arrival order.
    ByteStream {
        /// The chunk stream.
        stream: ByteStream,
        /// Optional declared media type.
        media_type: Option<String>,
    },

    /// A file on the local filesystem.
    FilePath {
        /// Path to read.
        path: PathBuf,
        /// Optional declared media type.
        media_type: Option<String>,
    },

    /// A URL the service fetches itself. Never downloaded locally.
    RemoteUrl(String),
}

impl fmt::Debug for FileInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64Text { text, media_type } => f
                .debug_struct("Base64Text")
                .field("text_len", &text.len())
                .field("media_type", media_type)
                .finish(),
            Self::RawBytes { data, media_type } => f
                .debug_struct("RawBytes")
                .field("data_len", &data.len())
                .field("media_type", media_type)
                .finish(),
            Self::ByteStream { media_type, .. } => f
                .debug_struct("ByteStream")
                .field("media_type", media_type)
                .finish_non_exhaustive(),
            Self::FilePath { path, media_type } => f
                .debug_struct("FilePath")
                .field("path", path)
                .field("media_type", media_type)
                .finish(),
            Self::RemoteUrl(url) => f.debug_tuple("RemoteUrl").field(url).finish(),
        }
    }
}

impl FileInput {
    /// Creates an input from base64-encoded text.
    pub fn from_base64(text: impl Into<String>) -> Self {
        Self::Base64Text {
            text: text.into(),
            media_type: None,
        }
    }

    /// Creates an input from raw bytes.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::RawBytes {
            data: data.into(),
            media_type: None,
        }
    }

    /// Creates an input from a stream of byte chunks.
    pub fn from_stream<S, B>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<B>> + Send + 'static,
        B: Into<Bytes> + 'static,
    {
        Self::ByteStream {
            stream: stream.map(|chunk| chunk.map(Into::into)).boxed(),
            media_type: None,
        }
    }

    /// Creates an input from an async reader, read in chunks.
    pub fn from_reader(reader: impl AsyncRead + Send + 'static) -> Self {
        Self::ByteStream {
            stream: ReaderStream::new(reader).boxed(),
            media_type: None,
        }
    }

    /// Creates an input from a file path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::FilePath {
            path: path.into(),
            media_type: None,
        }
    }

    /// Creates a URL input for service-side fetching.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self::RemoteUrl(url.into())
    }

    /// Declares the media type of the file content. Ignored for URL inputs.
    pub fn with_media_type(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            Self::Base64Text { media_type, .. }
            | Self::RawBytes { media_type, .. }
            | Self::ByteStream { media_type, .. }
            | Self::FilePath { media_type, .. } => *media_type = Some(value.into()),
            Self::RemoteUrl(_) => {}
        }
        self
    }

    /// Returns the declared media type, if any.
    pub fn media_type(&self) -> Option<&str> {
        match self {
            Self::Base64Text { media_type, .. }
            | Self::RawBytes { media_type, .. }
            | Self::ByteStream { media_type, .. }
            | Self::FilePath { media_type, .. } => media_type.as_deref(),
            Self::RemoteUrl(_) => None,
        }
    }

    /// Returns the content length if it is known without reading anything.
    pub fn size_hint(&self) -> Option<u64> {
        match self {
            Self::RawBytes { data, .. } => Some(data.len() as u64),
            _ => None,
        }
    }

    /// Returns `true` if this input is submitted by URL.
    pub fn is_remote_url(&self) -> bool {
        matches!(self, Self::RemoteUrl(_))
    }

    /// Returns `true` if this input is a one-shot stream.
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::ByteStream { .. })
    }
}

impl From<Vec<u8>> for FileInput {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl From<&[u8]> for FileInput {
    fn from(data: &[u8]) -> Self {
        Self::from_bytes(Bytes::copy_from_slice(data))
    }
}

impl From<Bytes> for FileInput {
    fn from(data: Bytes) -> Self {
        Self::from_bytes(data)
    }
}

impl From<PathBuf> for FileInput {
    fn from(path: PathBuf) -> Self {
        Self::from_path(path)
    }
}
