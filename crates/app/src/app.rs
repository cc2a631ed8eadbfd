//! Screen routing and UI chrome.

use crate::store_worker::{StoreRequest, StoreResponse, StoreWorker};
use crate::viewer::{ViewerOutcome, ViewerScreen};
use doc_model::auth::{Authenticator, Credentials, FixedAuthenticator};
use doc_model::screens::{
    apply_list_action, apply_login_action, apply_upload_action, ListAction, ListState, LoginAction,
    LoginState, UploadAction, UploadForm, UploadState,
};
use doc_model::{Document, DocumentMetadata};
use doc_store::DocumentStore;
use eframe::egui;
use std::path::PathBuf;
use std::time::Duration;

enum Screen {
    Login,
    Documents,
    Upload,
    Viewer,
}

struct ErrorDialogState {
    message: String,
}

pub struct DocShelfApp {
    screen: Screen,
    worker: Option<StoreWorker>,
    authenticator: FixedAuthenticator,

    // Login
    username: String,
    password: String,
    login: LoginState,

    // Document list
    list: ListState,

    // Upload form
    upload_form: UploadForm,
    upload: UploadState,

    // Viewer
    viewer: Option<ViewerScreen>,
    pending_open: Option<PathBuf>,

    error_dialog: Option<ErrorDialogState>,
}

impl DocShelfApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, pending_open: Option<PathBuf>) -> Self {
        let mut error_dialog = None;

        let worker = DocumentStore::from_default_project()
            .map_err(|err| err.to_string())
            .and_then(|store| StoreWorker::spawn(store).map_err(|err| err.to_string()))
            .map_err(|message| {
                tracing::error!(error = %message, "failed to start store worker");
                error_dialog =
                    Some(ErrorDialogState { message: format!("Failed to open store: {message}") });
            })
            .ok();

        Self {
            screen: Screen::Login,
            worker,
            authenticator: FixedAuthenticator::default(),
            username: String::new(),
            password: String::new(),
            login: LoginState::default(),
            list: ListState::default(),
            upload_form: UploadForm::default(),
            upload: UploadState::default(),
            viewer: None,
            pending_open,
            error_dialog,
        }
    }

    fn show_error(&mut self, message: impl Into<String>) {
        self.error_dialog = Some(ErrorDialogState { message: message.into() });
    }

    fn send(&self, request: StoreRequest) {
        if let Some(worker) = &self.worker {
            worker.send(request);
        }
    }

    fn request_list(&mut self) {
        apply_list_action(&mut self.list, ListAction::LoadStarted);
        self.send(StoreRequest::List);
    }

    fn poll_worker(&mut self) {
        let responses: Vec<StoreResponse> = match &self.worker {
            Some(worker) => std::iter::from_fn(|| worker.try_recv()).collect(),
            None => return,
        };

        for response in responses {
            match response {
                StoreResponse::Listed(Ok(mut documents)) => {
                    documents.sort_by_key(|document| document.id);
                    apply_list_action(&mut self.list, ListAction::Loaded(documents));
                }
                StoreResponse::Listed(Err(message)) => {
                    apply_list_action(&mut self.list, ListAction::LoadFailed(message));
                }
                StoreResponse::Saved(Ok(_)) => {
                    apply_upload_action(&mut self.upload, UploadAction::Completed);
                    self.upload_form = UploadForm::default();
                    self.screen = Screen::Documents;
                    self.request_list();
                }
                StoreResponse::Saved(Err(message)) => {
                    apply_upload_action(&mut self.upload, UploadAction::Failed(message));
                }
                StoreResponse::Deleted(Ok(id)) => {
                    apply_list_action(&mut self.list, ListAction::Removed(id));
                }
                StoreResponse::Deleted(Err(message)) => {
                    self.show_error(format!("Failed to delete document: {message}"));
                }
                StoreResponse::Cleared(Ok(_)) => {
                    apply_list_action(&mut self.list, ListAction::Cleared);
                }
                StoreResponse::Cleared(Err(message)) => {
                    self.show_error(format!("Failed to clear documents: {message}"));
                }
            }
        }
    }

    fn worker_busy(&self) -> bool {
        self.list.loading || self.upload == UploadState::InFlight
    }
}

impl eframe::App for DocShelfApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_worker();

        match self.screen {
            Screen::Login => self.draw_login(ctx),
            Screen::Documents => self.draw_documents(ctx),
            Screen::Upload => self.draw_upload(ctx),
            Screen::Viewer => self.draw_viewer(ctx),
        }

        self.draw_error_dialog(ctx);

        // Worker responses arrive outside the event loop; keep polling.
        if self.worker_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl DocShelfApp {
    fn draw_login(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                ui.heading("DocShelf");
                ui.add_space(24.0);

                ui.add(
                    egui::TextEdit::singleline(&mut self.username)
                        .hint_text("Username")
                        .desired_width(220.0),
                );
                ui.add_space(4.0);
                ui.add(
                    egui::TextEdit::singleline(&mut self.password)
                        .hint_text("Password")
                        .password(true)
                        .desired_width(220.0),
                );

                ui.add_space(12.0);

                let submitted = ui.button("Log in").clicked()
                    || ui.input(|i| i.key_pressed(egui::Key::Enter));
                if submitted {
                    self.submit_login();
                }

                if let LoginState::Rejected(reason) = &self.login {
                    ui.add_space(8.0);
                    ui.colored_label(ui.visuals().error_fg_color, reason);
                }
            });
        });
    }

    fn submit_login(&mut self) {
        let credentials = Credentials::new(self.username.clone(), self.password.clone());

        if let Err(err) = credentials.validate() {
            apply_login_action(&mut self.login, LoginAction::Rejected(err.to_string()));
            return;
        }

        apply_login_action(&mut self.login, LoginAction::Submitted);

        if self.authenticator.verify(&credentials) {
            apply_login_action(&mut self.login, LoginAction::Verified);
            self.password.clear();
            self.enter_documents();
        } else {
            apply_login_action(
                &mut self.login,
                LoginAction::Rejected("Invalid username or password".to_owned()),
            );
        }
    }

    fn enter_documents(&mut self) {
        self.screen = Screen::Documents;
        self.request_list();

        if let Some(path) = self.pending_open.take() {
            match ViewerScreen::open_path(&path) {
                Ok(viewer) => {
                    self.viewer = Some(viewer);
                    self.screen = Screen::Viewer;
                }
                Err(error) => {
                    self.show_error(format!("Failed to open {}: {error}", path.display()));
                }
            }
        }
    }

    fn log_out(&mut self) {
        apply_login_action(&mut self.login, LoginAction::Reset);
        self.username.clear();
        self.password.clear();
        self.viewer = None;
        self.screen = Screen::Login;
    }

    fn draw_documents(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("documents_toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Documents");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Log out").clicked() {
                        self.log_out();
                    }
                    if ui.button("Clear all").clicked() {
                        self.send(StoreRequest::Clear);
                    }
                    if ui.button("Refresh").clicked() {
                        self.request_list();
                    }
                    if ui.button("Upload").clicked() {
                        self.upload_form = UploadForm::default();
                        self.upload = UploadState::default();
                        self.screen = Screen::Upload;
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(error) = self.list.error.clone() {
                ui.colored_label(ui.visuals().error_fg_color, error);
                ui.separator();
            }

            if self.list.loading {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading…");
                });
                return;
            }

            if self.list.documents.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.weak("No documents yet. Upload one to get started.");
                });
                return;
            }

            let documents = self.list.documents.clone();
            egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                for document in &documents {
                    self.document_row(ui, document);
                    ui.separator();
                }
            });
        });
    }

    fn document_row(&mut self, ui: &mut egui::Ui, document: &Document) {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                let title = if document.metadata.title.is_empty() {
                    document.name.as_str()
                } else {
                    document.metadata.title.as_str()
                };
                ui.strong(title);

                let mut details =
                    format!("{} · {}", document.content_type.extension(), document.date);
                if !document.metadata.author.is_empty() {
                    details = format!("{details} · {}", document.metadata.author);
                }
                ui.small(details);
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Delete").clicked() {
                    self.send(StoreRequest::Delete(document.clone()));
                }
                if ui.button("Open").clicked() {
                    self.open_document(document);
                }
            });
        });
    }

    fn open_document(&mut self, document: &Document) {
        match ViewerScreen::open(document) {
            Ok(viewer) => {
                self.viewer = Some(viewer);
                self.screen = Screen::Viewer;
            }
            Err(error) => {
                self.show_error(format!("Failed to open document: {error}"));
            }
        }
    }

    fn draw_upload(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("upload_toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("← Back").clicked() {
                    self.screen = Screen::Documents;
                }
                ui.separator();
                ui.heading("Upload document");
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(12.0);

            ui.horizontal(|ui| {
                if ui.button("Choose file…").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Documents", &["pdf", "png", "jpg", "jpeg"])
                        .pick_file()
                    {
                        self.upload_form.source = Some(path);
                    }
                }
                match &self.upload_form.source {
                    Some(path) => ui.label(path.display().to_string()),
                    None => ui.weak("No file selected"),
                };
            });

            ui.add_space(8.0);

            egui::Grid::new("upload_fields").num_columns(2).spacing([8.0, 8.0]).show(ui, |ui| {
                ui.label("Name:");
                ui.text_edit_singleline(&mut self.upload_form.name);
                ui.end_row();

                ui.label("Title:");
                ui.text_edit_singleline(&mut self.upload_form.title);
                ui.end_row();

                ui.label("Author:");
                ui.text_edit_singleline(&mut self.upload_form.author);
                ui.end_row();

                ui.label("Description:");
                ui.text_edit_multiline(&mut self.upload_form.description);
                ui.end_row();
            });

            ui.add_space(12.0);

            let in_flight = self.upload == UploadState::InFlight;
            ui.horizontal(|ui| {
                if ui.add_enabled(!in_flight, egui::Button::new("Save")).clicked() {
                    self.submit_upload();
                }
                if in_flight {
                    ui.spinner();
                }
            });

            if let UploadState::Failed(message) = &self.upload {
                ui.add_space(8.0);
                ui.colored_label(ui.visuals().error_fg_color, message);
            }
        });
    }

    fn submit_upload(&mut self) {
        if let Err(err) = self.upload_form.validate() {
            apply_upload_action(&mut self.upload, UploadAction::Failed(err.to_string()));
            return;
        }

        // validate() guarantees a source is present.
        let Some(source) = self.upload_form.source.clone() else {
            return;
        };

        let metadata = DocumentMetadata {
            title: self.upload_form.title.clone(),
            author: self.upload_form.author.clone(),
            description: self.upload_form.description.clone(),
        };

        apply_upload_action(&mut self.upload, UploadAction::Started);
        self.send(StoreRequest::Save { source, metadata });
    }

    fn draw_viewer(&mut self, ctx: &egui::Context) {
        let Some(viewer) = &mut self.viewer else {
            self.screen = Screen::Documents;
            return;
        };

        match viewer.draw(ctx) {
            ViewerOutcome::Stay => {}
            ViewerOutcome::Back => {
                self.viewer = None;
                self.screen = Screen::Documents;
                self.request_list();
            }
            ViewerOutcome::Delete(document) => {
                self.send(StoreRequest::Delete(document));
                self.viewer = None;
                self.screen = Screen::Documents;
            }
        }
    }

    fn draw_error_dialog(&mut self, ctx: &egui::Context) {
        let Some(error) = &self.error_dialog else {
            return;
        };
        let message = error.message.clone();

        let mut should_close = false;
        egui::Window::new("❌ Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&message);
                ui.add_space(12.0);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                    if ui.button("OK").clicked() {
                        should_close = true;
                    }
                });
            });

        if should_close {
            self.error_dialog = None;
        }
    }
}
