//! Flat-file document store.
//!
//! Each document is a pair of files in one storage directory: `<id>.<ext>`
//! holding the content bytes and `<id>.meta` holding the sidecar metadata.
//! There is no index; listing re-scans the directory and re-parses sidecars.
//! Every operation opens and closes its own file handles, so a store value
//! can be shared freely across sequential callers.

use directories::ProjectDirs;
use doc_model::{ContentType, Document, DocumentId, DocumentMetadata};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod meta;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("unsupported content type: .{extension}")]
    UnsupportedContentType { extension: String },
    #[error("document {0} not found")]
    NotFound(DocumentId),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Input for [`DocumentStore::save`]: the caller assigns the id and stamps
/// the date; the store derives everything else.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: DocumentId,
    pub date: String,
    pub metadata: DocumentMetadata,
}

/// Extensions probed by [`DocumentStore::get`], in order.
const PROBE_ORDER: [ContentType; 3] = [ContentType::Pdf, ContentType::Png, ContentType::Jpeg];

#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Store rooted in the platform-local data directory.
    pub fn from_default_project() -> Result<Self, StoreError> {
        let dirs = ProjectDirs::from("dev", "DocShelf", "DocShelf")
            .ok_or(StoreError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().join("documents") })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copies `source` into the store as `<id>.<ext>` and writes the sidecar.
    ///
    /// The content type is taken from the source file's extension; anything
    /// outside `pdf`/`png`/`jpg`/`jpeg` is rejected before any file is
    /// touched.
    pub fn save(&self, new: &NewDocument, source: &Path) -> Result<Document, StoreError> {
        let content_type = ContentType::from_path(source).ok_or_else(|| {
            StoreError::UnsupportedContentType {
                extension: source
                    .extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            }
        })?;

        fs::create_dir_all(&self.root)?;

        let content_path = self.content_path(new.id, content_type);
        fs::copy(source, &content_path)?;
        fs::write(self.sidecar_path(new.id), meta::serialize(&new.metadata, &new.date))?;

        tracing::debug!(
            id = new.id.0,
            path = %content_path.display(),
            title = %new.metadata.title,
            "saved document"
        );

        Ok(Document {
            id: new.id,
            name: new.id.to_string(),
            date: new.date.clone(),
            content_path,
            content_type,
            metadata: new.metadata.clone(),
        })
    }

    /// Scans the storage directory and reconstructs every document.
    ///
    /// Sidecars, directories, and files whose name does not parse as
    /// `<decimal id>.<known ext>` are skipped; a broken entry never aborts
    /// the listing. Order is filesystem-dependent.
    pub fn list(&self) -> Result<Vec<Document>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) == Some(meta::SIDECAR_EXTENSION) {
                continue;
            }

            let Some(content_type) = ContentType::from_path(&path) else {
                tracing::warn!(path = %path.display(), "skipping entry with unrecognized extension");
                continue;
            };

            let Some(id) = parse_id(&path) else {
                tracing::warn!(path = %path.display(), "skipping entry with non-numeric stem");
                continue;
            };

            documents.push(self.assemble(id, path, content_type));
        }

        Ok(documents)
    }

    /// Looks a document up by id, probing `pdf`, `png`, `jpg` in that order.
    ///
    /// A missing document is `Ok(None)`, not an error.
    pub fn get(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        for content_type in PROBE_ORDER {
            let path = self.content_path(id, content_type);
            if path.is_file() {
                return Ok(Some(self.assemble(id, path, content_type)));
            }
        }

        Ok(None)
    }

    /// Removes a document's content file and sidecar.
    ///
    /// A missing content file is an error; a missing sidecar is tolerated.
    pub fn delete(&self, document: &Document) -> Result<(), StoreError> {
        match fs::remove_file(&document.content_path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(document.id));
            }
            Err(err) => return Err(err.into()),
        }

        match fs::remove_file(self.sidecar_path(document.id)) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        tracing::debug!(id = document.id.0, "deleted document");
        Ok(())
    }

    /// Removes every content/sidecar pair in the directory. Returns how many
    /// documents were removed. Unrelated files are left alone.
    pub fn delete_all(&self) -> Result<usize, StoreError> {
        if !self.root.exists() {
            return Ok(0);
        }

        let mut removed = 0;

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            let is_sidecar =
                path.extension().and_then(|ext| ext.to_str()) == Some(meta::SIDECAR_EXTENSION);
            let is_content = ContentType::from_path(&path).is_some() && parse_id(&path).is_some();

            if is_sidecar || is_content {
                fs::remove_file(&path)?;
                if is_content {
                    removed += 1;
                }
            }
        }

        tracing::debug!(removed, "cleared document store");
        Ok(removed)
    }

    fn assemble(&self, id: DocumentId, content_path: PathBuf, content_type: ContentType) -> Document {
        let sidecar = self.read_sidecar(id);

        Document {
            id,
            name: id.to_string(),
            date: sidecar.date,
            content_path,
            content_type,
            metadata: sidecar.metadata,
        }
    }

    /// A missing or unreadable sidecar degrades to default metadata; it is
    /// never an error at read time.
    fn read_sidecar(&self, id: DocumentId) -> meta::Sidecar {
        let path = self.sidecar_path(id);

        match fs::read_to_string(&path) {
            Ok(text) => meta::parse(&text),
            Err(err) if err.kind() == ErrorKind::NotFound => meta::Sidecar::default(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read sidecar");
                meta::Sidecar::default()
            }
        }
    }

    /// Picks a fresh id from the wall clock in milliseconds, bumping past
    /// ids that are already taken.
    pub fn next_id(&self) -> Result<DocumentId, StoreError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);

        let mut id = DocumentId(millis);
        while self.get(id)?.is_some() {
            id.0 += 1;
        }

        Ok(id)
    }

    fn content_path(&self, id: DocumentId, content_type: ContentType) -> PathBuf {
        self.root.join(format!("{id}.{}", content_type.extension()))
    }

    fn sidecar_path(&self, id: DocumentId) -> PathBuf {
        self.root.join(format!("{id}.{}", meta::SIDECAR_EXTENSION))
    }
}

fn parse_id(path: &Path) -> Option<DocumentId> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.parse().ok())
        .map(DocumentId)
}
