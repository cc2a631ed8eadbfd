//! Viewer screen: one page at a time, zoom, brightness boost for PDFs.

use doc_model::screens::{apply_viewer_action, ViewerAction, ViewerState};
use doc_model::Document;
use eframe::egui;
use std::path::Path;

use doc_render::{
    adjust_brightness, default_renderer, open_image, DocumentHandle, LopdfRenderer, OpenSource,
    PageRenderer, RenderError, RgbaImage,
};

/// Channel multiplier applied when the brightness boost is toggled on.
const BRIGHTNESS_BOOST: f32 = 1.5;

enum Content {
    Pdf { renderer: LopdfRenderer, handle: DocumentHandle },
    Image(RgbaImage),
}

/// Identity of the currently cached page texture.
#[derive(Clone, Copy, PartialEq, Eq)]
struct PageCacheKey {
    page: u32,
    zoom_percent: u32,
    brightened: bool,
}

/// What the user asked for on this frame.
#[derive(PartialEq)]
pub enum ViewerOutcome {
    Stay,
    Back,
    /// Delete the viewed document and return to the list.
    Delete(Document),
}

pub struct ViewerScreen {
    title: String,
    content: Content,
    state: ViewerState,
    /// Present when opened from the document list; absent for raw-path
    /// launches, which have nothing to delete.
    document: Option<Document>,
    brightened: bool,
    /// Only the page currently on screen is kept; stepping zoom or pages
    /// replaces it instead of accumulating full-page textures.
    texture: Option<(PageCacheKey, egui::TextureHandle)>,
}

impl ViewerScreen {
    pub fn open(document: &Document) -> Result<Self, RenderError> {
        let title = if document.metadata.title.is_empty() {
            document.name.clone()
        } else {
            document.metadata.title.clone()
        };

        let mut screen =
            Self::open_content(&document.content_path, document.content_type.is_pdf(), title)?;
        screen.document = Some(document.clone());
        Ok(screen)
    }

    /// Opens a raw content file, for `docshelf <file>` launches.
    pub fn open_path(path: &Path) -> Result<Self, RenderError> {
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::open_content(path, is_pdf, title)
    }

    fn open_content(path: &Path, is_pdf: bool, title: String) -> Result<Self, RenderError> {
        let (content, page_count) = if is_pdf {
            let mut renderer = default_renderer();
            let handle = renderer.open(OpenSource::from(path))?;
            let page_count = renderer.page_count(handle)?;
            (Content::Pdf { renderer, handle }, page_count)
        } else {
            (Content::Image(open_image(path)?), 1)
        };

        let mut state = ViewerState::default();
        apply_viewer_action(&mut state, ViewerAction::SetPageCount(page_count));

        Ok(Self {
            title,
            content,
            state,
            document: None,
            // PDF pages get the brightness boost from the start; the toolbar
            // toggle can turn it off.
            brightened: is_pdf,
            texture: None,
        })
    }

    fn is_pdf(&self) -> bool {
        matches!(self.content, Content::Pdf { .. })
    }

    pub fn draw(&mut self, ctx: &egui::Context) -> ViewerOutcome {
        let mut outcome = ViewerOutcome::Stay;

        egui::TopBottomPanel::top("viewer_toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("← Back").clicked() {
                    outcome = ViewerOutcome::Back;
                }

                ui.separator();
                ui.strong(&self.title);
                ui.separator();

                if self.state.page_count > 1 {
                    if ui.button("◀").clicked() {
                        apply_viewer_action(&mut self.state, ViewerAction::PreviousPage);
                    }
                    ui.label(format!("{} / {}", self.state.page_index + 1, self.state.page_count));
                    if ui.button("▶").clicked() {
                        apply_viewer_action(&mut self.state, ViewerAction::NextPage);
                    }
                    ui.separator();
                }

                if ui.add_enabled(self.state.can_zoom_out(), egui::Button::new("−")).clicked() {
                    apply_viewer_action(&mut self.state, ViewerAction::ZoomOut);
                }
                ui.label(format!("{}%", (self.state.zoom * 100.0).round() as i32));
                if ui.add_enabled(self.state.can_zoom_in(), egui::Button::new("+")).clicked() {
                    apply_viewer_action(&mut self.state, ViewerAction::ZoomIn);
                }

                if self.is_pdf() {
                    ui.separator();
                    ui.toggle_value(&mut self.brightened, "☀").on_hover_text("Boost brightness");
                }

                if let Some(document) = &self.document {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Delete").clicked() {
                            outcome = ViewerOutcome::Delete(document.clone());
                        }
                    });
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.page_texture(ctx) {
            Ok(texture) => {
                egui::ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
                    let size = egui::vec2(texture.size()[0] as f32, texture.size()[1] as f32);

                    // Center the page when it is smaller than the viewport.
                    let available = ui.available_size();
                    let padding_x = ((available.x - size.x) / 2.0).max(0.0);
                    let padding_y = ((available.y - size.y) / 2.0).max(0.0);

                    ui.add_space(padding_y);
                    ui.horizontal(|ui| {
                        ui.add_space(padding_x);
                        ui.image((texture.id(), size));
                    });
                });
            }
            Err(error) => {
                ui.centered_and_justified(|ui| {
                    ui.colored_label(
                        ui.visuals().error_fg_color,
                        format!("Failed to render page: {error}"),
                    );
                });
            }
        });

        outcome
    }

    fn page_texture(&mut self, ctx: &egui::Context) -> Result<egui::TextureHandle, RenderError> {
        let key = PageCacheKey {
            page: self.state.page_index,
            zoom_percent: (self.state.zoom * 100.0).round() as u32,
            brightened: self.brightened && self.is_pdf(),
        };

        if let Some((cached_key, texture)) = &self.texture {
            if *cached_key == key {
                return Ok(texture.clone());
            }
        }

        let mut image = match &self.content {
            Content::Pdf { renderer, handle } => {
                renderer.render_page(*handle, self.state.page_index, self.state.zoom)?
            }
            Content::Image(image) => scaled_image(image, self.state.zoom),
        };

        if key.brightened {
            adjust_brightness(&mut image, BRIGHTNESS_BOOST);
        }

        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [image.width() as usize, image.height() as usize],
            image.as_raw(),
        );
        let texture = ctx.load_texture(
            format!("page_{}_{}_{}", key.page, key.zoom_percent, key.brightened),
            color_image,
            egui::TextureOptions::LINEAR,
        );

        self.texture = Some((key, texture.clone()));
        Ok(texture)
    }
}

fn scaled_image(image: &RgbaImage, zoom: f32) -> RgbaImage {
    if (zoom - 1.0).abs() < f32::EPSILON {
        return image.clone();
    }

    let width = ((image.width() as f32 * zoom).round() as u32).max(1);
    let height = ((image.height() as f32 * zoom).round() as u32).max(1);

    image::imageops::resize(image, width, height, image::imageops::FilterType::Triangle)
}
