//! Per-screen state machines.
//!
//! Each screen's state is a plain value advanced by an `apply_*_action`
//! reducer; the UI dispatches actions and re-renders from the new state.
//! Nothing here performs I/O — store and authenticator outcomes re-enter the
//! reducers as actions.

use crate::{Document, DocumentId};
use std::path::PathBuf;

/// Lower zoom bound for the viewer.
pub const MIN_ZOOM: f32 = 0.5;
/// Upper zoom bound for the viewer.
pub const MAX_ZOOM: f32 = 3.0;
/// Multiplicative step applied per zoom in/out action.
pub const ZOOM_STEP: f32 = 1.1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoginState {
    #[default]
    Idle,
    Pending,
    Authenticated,
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginAction {
    /// Credentials passed field validation and were handed to the
    /// authenticator.
    Submitted,
    Verified,
    Rejected(String),
    Reset,
}

pub fn apply_login_action(state: &mut LoginState, action: LoginAction) {
    match action {
        LoginAction::Submitted => *state = LoginState::Pending,
        LoginAction::Verified => *state = LoginState::Authenticated,
        LoginAction::Rejected(reason) => *state = LoginState::Rejected(reason),
        LoginAction::Reset => *state = LoginState::Idle,
    }
}

/// Form contents of the upload dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    pub source: Option<PathBuf>,
    pub name: String,
    pub title: String,
    pub author: String,
    pub description: String,
}

impl UploadForm {
    /// Checks the form the way the upload screen does: a source file must be
    /// picked and every text field must be non-blank. The first violation
    /// wins.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.source.is_none() {
            return Err(UploadError::NoFileSelected);
        }
        if self.name.trim().is_empty() {
            return Err(UploadError::EmptyName);
        }
        if self.title.trim().is_empty() {
            return Err(UploadError::EmptyTitle);
        }
        if self.author.trim().is_empty() {
            return Err(UploadError::EmptyAuthor);
        }
        if self.description.trim().is_empty() {
            return Err(UploadError::EmptyDescription);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("No file selected")]
    NoFileSelected,
    #[error("Document name cannot be empty")]
    EmptyName,
    #[error("Document title cannot be empty")]
    EmptyTitle,
    #[error("Author name cannot be empty")]
    EmptyAuthor,
    #[error("Description cannot be empty")]
    EmptyDescription,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Idle,
    InFlight,
    Completed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadAction {
    Started,
    Completed,
    Failed(String),
    Reset,
}

pub fn apply_upload_action(state: &mut UploadState, action: UploadAction) {
    match action {
        UploadAction::Started => *state = UploadState::InFlight,
        UploadAction::Completed => *state = UploadState::Completed,
        UploadAction::Failed(message) => *state = UploadState::Failed(message),
        UploadAction::Reset => *state = UploadState::Idle,
    }
}

/// State backing the document list screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    pub documents: Vec<Document>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListAction {
    LoadStarted,
    Loaded(Vec<Document>),
    LoadFailed(String),
    Removed(DocumentId),
    Cleared,
}

pub fn apply_list_action(state: &mut ListState, action: ListAction) {
    match action {
        ListAction::LoadStarted => {
            state.loading = true;
            state.error = None;
        }
        ListAction::Loaded(documents) => {
            state.documents = documents;
            state.loading = false;
        }
        ListAction::LoadFailed(message) => {
            state.loading = false;
            state.error = Some(message);
        }
        ListAction::Removed(id) => {
            state.documents.retain(|document| document.id != id);
        }
        ListAction::Cleared => {
            state.documents.clear();
        }
    }
}

/// State backing the viewer screen: current page, page count, zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub page_index: u32,
    pub page_count: u32,
    pub zoom: f32,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self { page_index: 0, page_count: 1, zoom: 1.0 }
    }
}

impl ViewerState {
    pub fn can_zoom_in(&self) -> bool {
        self.zoom < MAX_ZOOM
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom > MIN_ZOOM
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    ZoomIn,
    ZoomOut,
    NextPage,
    PreviousPage,
    SetPageCount(u32),
}

pub fn apply_viewer_action(state: &mut ViewerState, action: ViewerAction) {
    match action {
        ViewerAction::ZoomIn => {
            state.zoom = (state.zoom * ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
        }
        ViewerAction::ZoomOut => {
            state.zoom = (state.zoom / ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
        }
        ViewerAction::NextPage => {
            state.page_index = (state.page_index + 1).min(state.page_count.saturating_sub(1));
        }
        ViewerAction::PreviousPage => {
            state.page_index = state.page_index.saturating_sub(1);
        }
        ViewerAction::SetPageCount(count) => {
            state.page_count = count.max(1);
            state.page_index = state.page_index.min(state.page_count - 1);
        }
    }
}
