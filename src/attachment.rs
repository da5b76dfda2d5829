//! Attachment loading, classification and text extraction
//!
//! Turns a user-selected file into something the payload builder can use:
//! a [`FileCategory`], optional extracted text, and an optional inline
//! base64 encoding. The size limit is enforced before any bytes are read.

use crate::error::{GemmaChatError, Result};
use base64::Engine;
use image::GenericImageView;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Largest attachment accepted unless configured otherwise (10 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Marker placed before each page of extracted PDF text
const PAGE_MARKER_PREFIX: &str = "--- Page";

/// Broad category of an attachment, derived from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// `image/*`
    Image,
    /// `audio/*`
    Audio,
    /// `video/*`
    Video,
    /// `application/*` and `text/*`
    Document,
    /// Anything else
    Other,
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
            Self::Document => write!(f, "document"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Classify a MIME type
///
/// Rules are checked in order: `image/`, `audio/`, `video/`, then
/// `application/pdf`, `application/*` and `text/*` as documents. Everything
/// else, including the empty string, is [`FileCategory::Other`].
///
/// # Examples
///
/// ```
/// use gemma_chat::attachment::{classify, FileCategory};
///
/// assert_eq!(classify("image/png"), FileCategory::Image);
/// assert_eq!(classify("application/pdf"), FileCategory::Document);
/// assert_eq!(classify(""), FileCategory::Other);
/// ```
pub fn classify(mime_type: &str) -> FileCategory {
    let mime = mime_type.trim().to_ascii_lowercase();

    if mime.starts_with("image/") {
        FileCategory::Image
    } else if mime.starts_with("audio/") {
        FileCategory::Audio
    } else if mime.starts_with("video/") {
        FileCategory::Video
    } else if mime == "application/pdf"
        || mime.starts_with("application/")
        || mime.starts_with("text/")
    {
        FileCategory::Document
    } else {
        FileCategory::Other
    }
}

/// Reject sizes above `limit`
///
/// # Errors
///
/// Returns [`GemmaChatError::FileTooLarge`] when `size > limit`
pub fn check_size(size: u64, limit: u64) -> Result<()> {
    if size > limit {
        tracing::warn!("Rejecting attachment of {} bytes (limit {})", size, limit);
        return Err(GemmaChatError::FileTooLarge { size, limit }.into());
    }
    Ok(())
}

/// A file the user picked, held in memory until it is sent or dropped
#[derive(Debug, Clone)]
pub struct AttachedFile {
    /// Display name (file name without directories)
    pub name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Raw content
    pub bytes: Vec<u8>,
    /// Local reference shown in the conversation (`file://...` or `data:`)
    pub reference: String,
}

impl AttachedFile {
    /// Build an attachment from bytes already in memory
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            reference: format!("memory://{}", name),
            name,
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Load an attachment from disk
    ///
    /// The on-disk size is compared with `max_size` before the file is read,
    /// so oversized files never reach memory.
    ///
    /// # Errors
    ///
    /// Returns `FileTooLarge` for oversized files and `Io` when the path
    /// cannot be read or is not a regular file
    pub async fn from_path(path: &Path, max_size: u64) -> Result<Self> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(GemmaChatError::Io)?;

        if !metadata.is_file() {
            return Err(GemmaChatError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ))
            .into());
        }

        check_size(metadata.len(), max_size)?;

        let bytes = tokio::fs::read(path).await.map_err(GemmaChatError::Io)?;
        let mime_type = detect_mime_type(path, &bytes);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let absolute = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| PathBuf::from(path));

        tracing::debug!(
            "Loaded attachment {} ({}, {} bytes)",
            name,
            mime_type,
            bytes.len()
        );

        Ok(Self {
            name,
            mime_type,
            bytes,
            reference: format!("file://{}", absolute.display()),
        })
    }

    /// Build an attachment from a pasted `data:<mime>;base64,<payload>` URL
    ///
    /// # Errors
    ///
    /// Returns `EncodingFailure` for anything that is not a base64 data URL
    /// and `FileTooLarge` when the decoded payload exceeds `max_size`
    pub fn from_data_url(name: impl Into<String>, data_url: &str, max_size: u64) -> Result<Self> {
        let trimmed = data_url.trim();
        let header = trimmed
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .map(|(header, _)| header)
            .ok_or_else(|| GemmaChatError::EncodingFailure("not a data URL".to_string()))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| {
                GemmaChatError::EncodingFailure("data URL is not base64 encoded".to_string())
            })?
            .to_string();

        let payload = strip_data_url_prefix(trimmed);

        // Reject on the encoded length first; decoded size is about 3/4 of it.
        check_size((payload.len() as u64 / 4) * 3, max_size)?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| GemmaChatError::EncodingFailure(format!("invalid base64: {}", e)))?;
        check_size(bytes.len() as u64, max_size)?;

        let mime_type = if mime_type.is_empty() {
            "application/octet-stream".to_string()
        } else {
            mime_type
        };

        Ok(Self {
            name: name.into(),
            reference: format!("data:{}", mime_type),
            mime_type,
            bytes,
        })
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Category derived from the declared MIME type
    pub fn category(&self) -> FileCategory {
        classify(&self.mime_type)
    }
}

/// Base64 payload ready to be placed in a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    /// MIME type of the encoded bytes
    pub mime_type: String,
    /// Bare base64 text, never prefixed with `data:`
    pub base64: String,
}

/// Remove a `data:<mime>;base64,` prefix if present
///
/// # Examples
///
/// ```
/// use gemma_chat::attachment::strip_data_url_prefix;
///
/// assert_eq!(strip_data_url_prefix("data:image/png;base64,iVBOR"), "iVBOR");
/// assert_eq!(strip_data_url_prefix("iVBOR"), "iVBOR");
/// ```
pub fn strip_data_url_prefix(encoded: &str) -> &str {
    if encoded.starts_with("data:") {
        if let Some((_, payload)) = encoded.split_once(',') {
            return payload;
        }
    }
    encoded
}

/// Encode an image or audio attachment as base64
///
/// Other categories are not sent inline and yield `Ok(None)`.
///
/// # Errors
///
/// Returns `EncodingFailure` for an empty image or audio file
pub fn to_inline_encoding(file: &AttachedFile) -> Result<Option<InlineData>> {
    match file.category() {
        FileCategory::Image | FileCategory::Audio => {}
        _ => return Ok(None),
    }

    if file.bytes.is_empty() {
        return Err(GemmaChatError::EncodingFailure(format!("{} is empty", file.name)).into());
    }

    Ok(Some(InlineData {
        mime_type: file.mime_type.clone(),
        base64: base64::engine::general_purpose::STANDARD.encode(&file.bytes),
    }))
}

/// Extract readable text from an attachment
///
/// `text/*` is decoded as (lossy) UTF-8. PDFs are read page by page on a
/// blocking thread. Every other type yields `Ok(None)`.
///
/// # Errors
///
/// Returns `ExtractionFailure` when a PDF cannot be parsed
pub async fn extract_text(file: &AttachedFile) -> Result<Option<String>> {
    let mime = file.mime_type.to_ascii_lowercase();

    if mime.starts_with("text/") {
        return Ok(Some(String::from_utf8_lossy(&file.bytes).into_owned()));
    }

    if mime != "application/pdf" {
        return Ok(None);
    }

    let bytes = file.bytes.clone();
    let pages = tokio::task::spawn_blocking(move || extract_pdf_pages(&bytes))
        .await
        .map_err(|e| GemmaChatError::ExtractionFailure(format!("task join error: {}", e)))??;

    tracing::info!(page_count = pages.len(), "PDF text extraction complete");
    Ok(Some(format_pages(&pages)))
}

/// Join per-page text in page order, each page headed by its marker
pub fn format_pages(pages: &[String]) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(idx, text)| format!("{} {} ---\n{}", PAGE_MARKER_PREFIX, idx + 1, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<String>> {
    let mut staged = NamedTempFile::new().map_err(|e| {
        GemmaChatError::ExtractionFailure(format!("failed to create temp file: {}", e))
    })?;
    staged.write_all(bytes).map_err(|e| {
        GemmaChatError::ExtractionFailure(format!("failed to write temp file: {}", e))
    })?;

    let doc = pdf_oxide::PdfDocument::open(staged.path())
        .map_err(|e| GemmaChatError::ExtractionFailure(format!("failed to parse PDF: {}", e)))?;

    let page_count = doc.page_count().map_err(|e| {
        GemmaChatError::ExtractionFailure(format!("failed to read page count: {}", e))
    })?;

    if page_count == 0 {
        return Err(GemmaChatError::ExtractionFailure("PDF has no pages".to_string()).into());
    }

    let mut pages = Vec::with_capacity(page_count);
    for page_index in 0..page_count {
        let raw = doc.extract_text(page_index).map_err(|e| {
            GemmaChatError::ExtractionFailure(format!(
                "failed to read page {}: {}",
                page_index + 1,
                e
            ))
        })?;
        pages.push(raw.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    Ok(pages)
}

/// Determine a MIME type from magic bytes, then the file extension
///
/// # Examples
///
/// ```
/// use gemma_chat::attachment::detect_mime_type;
/// use std::path::Path;
///
/// assert_eq!(detect_mime_type(Path::new("a.bin"), b"%PDF-1.7"), "application/pdf");
/// assert_eq!(detect_mime_type(Path::new("notes.md"), b"# hi"), "text/markdown");
/// ```
pub fn detect_mime_type(path: &Path, bytes: &[u8]) -> String {
    if let Some(mime) = sniff_magic_bytes(bytes) {
        return mime.to_string();
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    mime_for_extension(&ext)
        .unwrap_or("application/octet-stream")
        .to_string()
}

fn sniff_magic_bytes(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG") {
        Some("image/png")
    } else if bytes.starts_with(b"\xff\xd8\xff") {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.starts_with(b"RIFF") && bytes.len() >= 12 && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"RIFF") && bytes.len() >= 12 && &bytes[8..12] == b"WAVE" {
        Some("audio/wav")
    } else if bytes.starts_with(b"BM") && bytes.len() >= 14 {
        Some("image/bmp")
    } else if bytes.starts_with(b"II\x2a\x00") || bytes.starts_with(b"MM\x00\x2a") {
        Some("image/tiff")
    } else if bytes.starts_with(b"%PDF-") {
        Some("application/pdf")
    } else if bytes.starts_with(b"OggS") {
        Some("audio/ogg")
    } else if bytes.starts_with(b"fLaC") {
        Some("audio/flac")
    } else if bytes.starts_with(b"ID3") || bytes.starts_with(b"\xff\xfb") {
        Some("audio/mpeg")
    } else if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        Some("video/mp4")
    } else if bytes.starts_with(b"\x1a\x45\xdf\xa3") {
        Some("video/webm")
    } else {
        None
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "xml" => "text/xml",
        "rs" | "py" | "js" | "ts" | "go" | "c" | "h" | "cpp" | "java" | "toml" | "yaml"
        | "yml" | "sh" => "text/plain",
        _ => return None,
    };
    Some(mime)
}

/// A temporary on-disk copy of an image used for previewing
///
/// The file is removed when the handle is dropped or [`ImagePreview::release`]
/// is called, whichever happens first.
#[derive(Debug)]
pub struct ImagePreview {
    file: NamedTempFile,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImagePreview {
    /// Create a preview for an image attachment
    ///
    /// Returns `Ok(None)` for non-image attachments.
    ///
    /// # Errors
    ///
    /// Returns `EncodingFailure` if the image cannot be decoded and `Io` if
    /// the preview file cannot be written
    pub fn create(file: &AttachedFile) -> Result<Option<Self>> {
        if file.category() != FileCategory::Image {
            return Ok(None);
        }

        let image = image::load_from_memory(&file.bytes).map_err(|e| {
            GemmaChatError::EncodingFailure(format!("cannot decode {}: {}", file.name, e))
        })?;
        let (width, height) = image.dimensions();

        let suffix = Path::new(&file.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let mut preview = tempfile::Builder::new()
            .prefix("gemma-chat-preview-")
            .suffix(&suffix)
            .tempfile()
            .map_err(GemmaChatError::Io)?;
        preview.write_all(&file.bytes).map_err(GemmaChatError::Io)?;

        tracing::debug!("Created preview {}", preview.path().display());

        Ok(Some(Self {
            file: preview,
            width,
            height,
        }))
    }

    /// Path of the preview file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// `file://` URL for terminals that can open links
    pub fn url(&self) -> String {
        format!("file://{}", self.file.path().display())
    }

    /// Remove the preview file now and report any failure
    pub fn release(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        self.file.close().map_err(GemmaChatError::Io)?;
        tracing::debug!("Released preview {}", path.display());
        Ok(())
    }
}
