//! Shared document model for the DocShelf store, CLI, and desktop app.
//!
//! Everything in this crate is pure data: the `Document` record that the
//! store persists, the content-type table that decides file extensions, and
//! the per-screen state machines the UI drives through reducer functions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub mod auth;
pub mod screens;

pub use screens::{
    apply_list_action, apply_login_action, apply_upload_action, apply_viewer_action, ListAction,
    ListState, LoginAction, LoginState, UploadAction, UploadError, UploadForm, UploadState,
    ViewerAction, ViewerState, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP,
};

/// Identifier of a stored document.
///
/// Assigned at upload time from a millisecond timestamp; the decimal string
/// of the id is also the base name of the document's files on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content kinds the store accepts. Anything else is rejected at save time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Pdf,
    Png,
    Jpeg,
}

impl ContentType {
    /// The on-disk extension for this content type.
    ///
    /// JPEG content is always stored as `jpg` so that lookup by id only has
    /// to probe one spelling.
    pub fn extension(self) -> &'static str {
        match self {
            ContentType::Pdf => "pdf",
            ContentType::Png => "png",
            ContentType::Jpeg => "jpg",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(ContentType::Pdf),
            "png" => Some(ContentType::Png),
            "jpg" | "jpeg" => Some(ContentType::Jpeg),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|ext| ext.to_str()).and_then(Self::from_extension)
    }

    pub fn is_pdf(self) -> bool {
        matches!(self, ContentType::Pdf)
    }
}

/// Sidecar metadata for a document.
///
/// Fields absent from the sidecar file default to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub description: String,
}

/// A stored document record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Display name, derived from the content file stem (the id's decimal
    /// string); the sidecar schema does not persist a separate name.
    pub name: String,
    /// ISO `YYYY-MM-DD`, stamped at upload time and stored in the sidecar.
    pub date: String,
    /// Content locator: path of the content file inside the store.
    pub content_path: PathBuf,
    pub content_type: ContentType,
    pub metadata: DocumentMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_maps_known_extensions() {
        assert_eq!(ContentType::from_extension("pdf"), Some(ContentType::Pdf));
        assert_eq!(ContentType::from_extension("PNG"), Some(ContentType::Png));
        assert_eq!(ContentType::from_extension("jpeg"), Some(ContentType::Jpeg));
        assert_eq!(ContentType::from_extension("jpg"), Some(ContentType::Jpeg));
        assert_eq!(ContentType::from_extension("gif"), None);
    }

    #[test]
    fn jpeg_normalizes_to_jpg_on_disk() {
        assert_eq!(ContentType::from_extension("jpeg").map(ContentType::extension), Some("jpg"));
    }

    #[test]
    fn content_type_from_path_uses_extension() {
        assert_eq!(ContentType::from_path(Path::new("/store/17.pdf")), Some(ContentType::Pdf));
        assert_eq!(ContentType::from_path(Path::new("/store/17.meta")), None);
        assert_eq!(ContentType::from_path(Path::new("/store/noext")), None);
    }

    #[test]
    fn document_id_displays_as_decimal() {
        assert_eq!(DocumentId(1721923200000).to_string(), "1721923200000");
    }
}
