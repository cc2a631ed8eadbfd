//! Page rendering for stored documents.
//!
//! PDFs go through the [`PageRenderer`] trait. The default backend parses
//! page metrics with `lopdf` and rasterizes a placeholder page surface; the
//! `pdfium` feature swaps in a system rasterizer. Raster images (PNG/JPEG)
//! are decoded with the `image` crate and treated as single-page documents.
//!
//! The one bespoke pixel operation is [`adjust_brightness`], the viewer's
//! brightness boost.

use image::{ImageBuffer, Rgba};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Opaque handle to a document opened by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

/// US Letter, the fallback when a page carries no usable MediaBox.
const DEFAULT_PAGE_SIZE: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Renders pages of an opened PDF document.
pub trait PageRenderer {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, RenderError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, RenderError>;
    fn page_size(&self, handle: DocumentHandle, page_index: u32) -> Result<PageSize, RenderError>;
    /// Rasterizes one page at `scale` pixels per point.
    fn render_page(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        scale: f32,
    ) -> Result<RgbaImage, RenderError>;
    fn close(&mut self, handle: DocumentHandle) -> Result<(), RenderError>;
}

#[derive(Debug, Clone)]
struct OpenDocument {
    page_sizes: Vec<PageSize>,
}

/// Default renderer: real page metrics via `lopdf`, placeholder raster.
#[derive(Debug, Default)]
pub struct LopdfRenderer {
    next_handle: u64,
    docs: HashMap<DocumentHandle, OpenDocument>,
}

impl LopdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_sizes(bytes: &[u8]) -> Result<Vec<PageSize>, RenderError> {
        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(RenderError::EncryptedUnsupported);
        }

        let doc = lopdf::Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let dict = doc.get_dictionary(object_id)?;
            let size = dict
                .get(b"MediaBox")
                .ok()
                .and_then(|obj| obj.as_array().ok())
                .and_then(|array| {
                    if array.len() != 4 {
                        return None;
                    }
                    let x0 = array[0].as_float().ok()?;
                    let y0 = array[1].as_float().ok()?;
                    let x1 = array[2].as_float().ok()?;
                    let y1 = array[3].as_float().ok()?;
                    Some(PageSize { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() })
                })
                .unwrap_or(DEFAULT_PAGE_SIZE);

            sizes.push(size);
        }

        if sizes.is_empty() {
            return Err(RenderError::Backend("document has no pages".to_owned()));
        }

        Ok(sizes)
    }

    fn record(&self, handle: DocumentHandle) -> Result<&OpenDocument, RenderError> {
        self.docs.get(&handle).ok_or(RenderError::InvalidHandle(handle.raw()))
    }
}

impl PageRenderer for LopdfRenderer {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, RenderError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let page_sizes = Self::parse_sizes(&bytes)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        self.docs.insert(handle, OpenDocument { page_sizes });

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, RenderError> {
        Ok(self.record(handle)?.page_sizes.len() as u32)
    }

    fn page_size(&self, handle: DocumentHandle, page_index: u32) -> Result<PageSize, RenderError> {
        let record = self.record(handle)?;
        record.page_sizes.get(page_index as usize).copied().ok_or(RenderError::PageOutOfRange {
            page: page_index,
            page_count: record.page_sizes.len() as u32,
        })
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        scale: f32,
    ) -> Result<RgbaImage, RenderError> {
        let page_size = self.page_size(handle, page_index)?;
        let scale = if scale <= 0.0 { 1.0 } else { scale };

        let width = (page_size.width_pt * scale).round().max(1.0) as u32;
        let height = (page_size.height_pt * scale).round().max(1.0) as u32;

        // Placeholder surface: white page with a light border. The pdfium
        // feature replaces this with real content.
        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, Rgba([220, 220, 220, 255]));
                image.put_pixel(x, height - 1, Rgba([220, 220, 220, 255]));
            }
            for y in 0..height {
                image.put_pixel(0, y, Rgba([220, 220, 220, 255]));
                image.put_pixel(width - 1, y, Rgba([220, 220, 220, 255]));
            }
        }

        Ok(image)
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), RenderError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(RenderError::InvalidHandle(handle.raw()))
    }
}

pub fn default_renderer() -> LopdfRenderer {
    LopdfRenderer::new()
}

/// Decodes PNG/JPEG bytes into an RGBA image.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, RenderError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Decodes a PNG/JPEG file into an RGBA image.
pub fn open_image(path: &Path) -> Result<RgbaImage, RenderError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Multiplies the R/G/B channels of every pixel by `factor`, saturating at
/// the channel bounds. Alpha is untouched.
pub fn adjust_brightness(image: &mut RgbaImage, factor: f32) {
    for pixel in image.pixels_mut() {
        for channel in 0..3 {
            let scaled = (f32::from(pixel[channel]) * factor).round();
            pixel[channel] = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(feature = "pdfium")]
pub mod pdfium_backend {
    use super::*;
    use pdfium_render::prelude::*;

    /// Renderer backed by the system pdfium library.
    ///
    /// Metrics come from the shared `lopdf` path so both backends agree on
    /// page geometry; rasterization goes through pdfium.
    pub struct PdfiumRenderer {
        inner: LopdfRenderer,
        bytes: HashMap<DocumentHandle, Vec<u8>>,
    }

    impl PdfiumRenderer {
        pub fn from_system_library() -> Result<Self, RenderError> {
            let _ = Pdfium::bind_to_system_library().map_err(|err| {
                RenderError::Backend(format!("failed to bind pdfium system library: {err}"))
            })?;

            Ok(Self { inner: LopdfRenderer::default(), bytes: HashMap::new() })
        }
    }

    impl PageRenderer for PdfiumRenderer {
        fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, RenderError> {
            let bytes = match source {
                OpenSource::Path(path) => fs::read(path)?,
                OpenSource::Bytes(bytes) => bytes,
            };

            let handle = self.inner.open(OpenSource::Bytes(bytes.clone()))?;
            self.bytes.insert(handle, bytes);
            Ok(handle)
        }

        fn page_count(&self, handle: DocumentHandle) -> Result<u32, RenderError> {
            self.inner.page_count(handle)
        }

        fn page_size(
            &self,
            handle: DocumentHandle,
            page_index: u32,
        ) -> Result<PageSize, RenderError> {
            self.inner.page_size(handle, page_index)
        }

        fn render_page(
            &self,
            handle: DocumentHandle,
            page_index: u32,
            scale: f32,
        ) -> Result<RgbaImage, RenderError> {
            let bytes = self
                .bytes
                .get(&handle)
                .ok_or(RenderError::InvalidHandle(handle.raw()))?;
            let size = self.page_size(handle, page_index)?;
            let scale = if scale <= 0.0 { 1.0 } else { scale };

            let pdfium = Pdfium::new(Pdfium::bind_to_system_library().map_err(|err| {
                RenderError::Backend(format!("failed to bind pdfium system library: {err}"))
            })?);
            let document = pdfium
                .load_pdf_from_byte_slice(bytes, None)
                .map_err(|err| RenderError::Backend(err.to_string()))?;
            let page = document
                .pages()
                .get(page_index as u16)
                .map_err(|err| RenderError::Backend(err.to_string()))?;

            let config = PdfRenderConfig::new()
                .set_target_width((size.width_pt * scale).round().max(1.0) as i32)
                .set_target_height((size.height_pt * scale).round().max(1.0) as i32);

            let bitmap = page
                .render_with_config(&config)
                .map_err(|err| RenderError::Backend(err.to_string()))?;

            Ok(bitmap.as_image().to_rgba8())
        }

        fn close(&mut self, handle: DocumentHandle) -> Result<(), RenderError> {
            self.bytes.remove(&handle);
            self.inner.close(handle)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use std::io::Cursor;

    fn sample_pdf(page_count: usize) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::new();

        for _ in 0..page_count {
            let content = Content {
                operations: vec![
                    Operation::new("re", vec![72.into(), 72.into(), 468.into(), 648.into()]),
                    Operation::new("S", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("content should encode"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("pdf should serialize");
        bytes
    }

    fn sample_png() -> Vec<u8> {
        let mut image = RgbaImage::from_pixel(8, 6, Rgba([10, 20, 30, 255]));
        image.put_pixel(0, 0, Rgba([200, 100, 50, 255]));

        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("png should encode");
        bytes
    }

    #[test]
    fn opens_pdf_and_reads_page_metrics() {
        let mut renderer = LopdfRenderer::new();
        let handle = renderer.open(OpenSource::Bytes(sample_pdf(3))).expect("open should succeed");

        assert_eq!(renderer.page_count(handle).unwrap(), 3);

        let size = renderer.page_size(handle, 1).unwrap();
        assert_eq!(size.width_pt, 612.0);
        assert_eq!(size.height_pt, 792.0);
    }

    #[test]
    fn render_page_scales_to_requested_size() {
        let mut renderer = LopdfRenderer::new();
        let handle = renderer.open(OpenSource::Bytes(sample_pdf(1))).unwrap();

        let image = renderer.render_page(handle, 0, 0.5).unwrap();
        assert_eq!(image.width(), 306);
        assert_eq!(image.height(), 396);
    }

    #[test]
    fn page_out_of_range_is_a_typed_error() {
        let mut renderer = LopdfRenderer::new();
        let handle = renderer.open(OpenSource::Bytes(sample_pdf(2))).unwrap();

        let err = renderer.page_size(handle, 5).unwrap_err();
        assert!(matches!(err, RenderError::PageOutOfRange { page: 5, page_count: 2 }));
    }

    #[test]
    fn invalid_handle_is_rejected() {
        let renderer = LopdfRenderer::new();
        let err = renderer.page_count(DocumentHandle(999)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidHandle(999)));
    }

    #[test]
    fn close_releases_the_handle() {
        let mut renderer = LopdfRenderer::new();
        let handle = renderer.open(OpenSource::Bytes(sample_pdf(1))).unwrap();

        renderer.close(handle).unwrap();
        assert!(matches!(renderer.page_count(handle), Err(RenderError::InvalidHandle(_))));
    }

    #[test]
    fn encrypted_marker_is_rejected() {
        let bytes = b"%PDF-1.5\n/Encrypt 1 0 R\n%%EOF".to_vec();
        let mut renderer = LopdfRenderer::new();

        let err = renderer.open(OpenSource::Bytes(bytes)).unwrap_err();
        assert!(matches!(err, RenderError::EncryptedUnsupported));
    }

    #[test]
    fn decode_image_round_trips_pixels() {
        let image = decode_image(&sample_png()).expect("png should decode");

        assert_eq!(image.width(), 8);
        assert_eq!(image.height(), 6);
        assert_eq!(image.get_pixel(0, 0), &Rgba([200, 100, 50, 255]));
        assert_eq!(image.get_pixel(3, 3), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn brightness_scales_channels_and_saturates() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([100, 200, 0, 128]));

        adjust_brightness(&mut image, 1.5);

        let pixel = image.get_pixel(0, 0);
        assert_eq!(pixel[0], 150);
        assert_eq!(pixel[1], 255); // saturated, not wrapped
        assert_eq!(pixel[2], 0);
        assert_eq!(pixel[3], 128); // alpha untouched
    }

    #[test]
    fn brightness_factor_below_one_darkens() {
        let mut image = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));

        adjust_brightness(&mut image, 0.5);

        assert_eq!(image.get_pixel(0, 0), &Rgba([50, 50, 50, 255]));
    }
}
