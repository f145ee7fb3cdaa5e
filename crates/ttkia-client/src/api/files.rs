//! File upload API.

use std::path::Path;

use reqwest::multipart::{Form, Part};

use super::endpoints;
use crate::client::TtkiaClient;
use crate::error::{Error, Result};
use crate::types::UploadedFile;

/// Fallback MIME type.
const OCTET_STREAM: &str = "application/octet-stream";

/// Extensions resolved before consulting `mime_guess`.
const KNOWN_TYPES: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("md", "text/markdown"),
    ("rtf", "application/rtf"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("odp", "application/vnd.oasis.opendocument.presentation"),
    ("pbix", OCTET_STREAM),
];

/// Resolve the MIME type sent for a file.
///
/// Checks the fixed extension table (case-insensitive), then `mime_guess`,
/// then falls back to `application/octet-stream`.
pub fn content_type_for(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if let Some(ext) = extension.as_deref()
        && let Some((_, mime)) = KNOWN_TYPES.iter().find(|(known, _)| *known == ext)
    {
        return mime.to_string();
    }

    mime_guess::from_path(path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// File upload API client.
pub struct FilesApi {
    client: TtkiaClient,
}

impl FilesApi {
    pub(crate) fn new(client: TtkiaClient) -> Self {
        Self { client }
    }

    /// Upload a local file to a conversation.
    ///
    /// Fails with [`Error::FileNotFound`] before any request when `path` is
    /// not an existing file. Without `conversation_id` the server picks the
    /// active workspace. `custom_filename` replaces the name sent to the server.
    pub async fn upload(
        &self,
        path: impl AsRef<Path>,
        conversation_id: Option<&str>,
        custom_filename: Option<&str>,
    ) -> Result<UploadedFile> {
        let path = path.as_ref();

        let is_file = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            tracing::error!(path = %path.display(), "File not found");
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let filename = custom_filename
            .map(str::to_string)
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .ok_or_else(|| Error::FileNotFound(path.to_path_buf()))?;

        // Read fully so the handle is closed before the request goes out.
        let bytes = tokio::fs::read(path).await.map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let size = bytes.len();
        let mime = content_type_for(path);

        tracing::info!(filename = %filename, size, mime = %mime, "Uploading file");

        let part = Part::bytes(bytes).file_name(filename.clone()).mime_str(&mime)?;
        let mut form = Form::new().part("file", part);
        if let Some(id) = conversation_id {
            form = form.text("conversation_id", id.to_string());
        }

        let uploaded: UploadedFile = self
            .client
            .post_multipart(endpoints::UPLOAD, form)
            .await
            .inspect_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "Failed to upload file")
            })?;

        tracing::info!(
            name = uploaded.name.as_deref().unwrap_or(&filename),
            "File uploaded"
        );
        Ok(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_table_first() {
        assert_eq!(content_type_for(Path::new("a/report.PDF")), "application/pdf");
        assert_eq!(content_type_for(Path::new("notes.md")), "text/markdown");
        assert_eq!(
            content_type_for(Path::new("deck.pptx")),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        );
        assert_eq!(content_type_for(Path::new("dash.pbix")), OCTET_STREAM);
    }

    #[test]
    fn test_falls_back_to_mime_guess() {
        assert_eq!(content_type_for(Path::new("photo.png")), "image/png");
    }

    #[test]
    fn test_unknown_is_octet_stream() {
        assert_eq!(content_type_for(Path::new("blob.zzqx")), OCTET_STREAM);
        assert_eq!(content_type_for(Path::new("Makefile")), OCTET_STREAM);
    }
}
