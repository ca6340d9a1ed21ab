//! PDF export: rasterize the preview and lay the bitmap on A4 pages; when any
//! step of that fails, flow the preview's plain text onto pages instead.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use maud::{html, PreEscaped};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use super::font_metrics::HELVETICA;
use super::services::{
    Bitmap, ClipRect, DocumentLayout, PageItem, PageLayout, PdfAuthor, RasterRequest,
    Rasterizer, ServiceError,
};
use super::text_flow::{paginate, wrap_paragraphs, TextFlowSettings};
use super::{filename_safe, ExportFile};
use crate::preview::{text, PreviewDocument};

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// CSS pixels per millimetre at 96 dpi.
const PX_PER_MM: f32 = 96.0 / 25.4;

pub const PDF_SUCCESS: &str = "PDF downloaded successfully!";
pub const PDF_TEXT_SUCCESS: &str = "PDF downloaded (text version).";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF generation failed completely. Please use HTML download.")]
    BothStrategiesFailed {
        primary: ServiceError,
        fallback: ServiceError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfStrategy {
    Raster,
    TextFallback,
}

impl PdfStrategy {
    pub fn notice(self) -> &'static str {
        match self {
            PdfStrategy::Raster => PDF_SUCCESS,
            PdfStrategy::TextFallback => PDF_TEXT_SUCCESS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PdfSettings {
    /// Width of the printed content inside the off-screen container.
    pub print_width_mm: f32,
    pub container_width_mm: f32,
    /// Pause before rasterizing so web fonts and images can load.
    pub settle_delay: Duration,
    pub scale: f32,
    pub background: String,
    pub margin_mm: f32,
    pub text_flow: TextFlowSettings,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            print_width_mm: 190.0,
            container_width_mm: A4_WIDTH_MM,
            settle_delay: Duration::from_millis(500),
            scale: 2.0,
            background: "#ffffff".to_string(),
            margin_mm: 10.0,
            text_flow: TextFlowSettings::default(),
        }
    }
}

impl PdfSettings {
    fn printable_width_mm(&self) -> f32 {
        A4_WIDTH_MM - 2.0 * self.margin_mm
    }

    fn printable_height_mm(&self) -> f32 {
        A4_HEIGHT_MM - 2.0 * self.margin_mm
    }
}

#[derive(Debug, Clone)]
pub struct PdfOutcome {
    pub file: ExportFile,
    pub strategy: PdfStrategy,
}

/// `<profession>-resume.pdf`, or `portfolio-resume.pdf` without one.
pub fn pdf_filename(profession: &str) -> String {
    let stem = filename_safe(profession);
    let stem = if stem.is_empty() { "portfolio" } else { stem.as_str() };
    format!("{stem}-resume.pdf")
}

/// Off-screen print container around the preview: fixed width, white
/// background, black 12px text. The preview's custom properties are kept so
/// template colors still resolve.
pub fn print_markup(preview: &PreviewDocument, settings: &PdfSettings) -> String {
    let outer = format!(
        "width: {}mm; background: {};",
        settings.container_width_mm, settings.background
    );
    let inner = format!(
        "{} width: {}mm; padding: 20px; background: {}; color: black; font-size: 12px;",
        preview.container_style, settings.print_width_mm, settings.background
    );
    html! {
        div style=(outer) {
            div style=(inner) { (PreEscaped(&preview.markup)) }
        }
    }
    .into_string()
}

/// Places the bitmap at the top margin, scaled to the printable width, and
/// continues it on further pages while it is taller than the printable
/// height. Every page is clipped to the printable area, so each shows only
/// its own slice of the bitmap.
pub fn raster_layout(bitmap: &Bitmap, settings: &PdfSettings) -> Result<DocumentLayout, ServiceError> {
    if bitmap.width_px == 0 || bitmap.height_px == 0 {
        return Err(ServiceError::Malformed {
            service: "rasterizer",
            reason: format!("empty bitmap {}x{}", bitmap.width_px, bitmap.height_px),
        });
    }
    let width_mm = settings.printable_width_mm();
    let height_mm = bitmap.height_px as f32 * width_mm / bitmap.width_px as f32;
    let page_span = settings.printable_height_mm();
    let page_count = ((height_mm / page_span).ceil() as usize).max(1);
    let printable = ClipRect {
        x_mm: settings.margin_mm,
        y_mm: settings.margin_mm,
        width_mm,
        height_mm: page_span,
    };

    let pages = (0..page_count)
        .map(|k| PageLayout {
            clip: Some(printable),
            items: vec![PageItem::Image {
                x_mm: settings.margin_mm,
                y_mm: settings.margin_mm - k as f32 * page_span,
                width_mm,
                height_mm,
            }],
        })
        .collect();

    Ok(DocumentLayout {
        page_width_mm: A4_WIDTH_MM,
        page_height_mm: A4_HEIGHT_MM,
        font: HELVETICA.name.to_string(),
        font_size_pt: settings.text_flow.font_size_pt,
        pages,
    })
}

/// Text-only pages built from the preview's rendered text.
pub fn text_layout(preview: &PreviewDocument, settings: &PdfSettings) -> DocumentLayout {
    let flow = &settings.text_flow;
    let paragraphs = text::text_lines(&preview.markup);
    let lines = wrap_paragraphs(&paragraphs, &HELVETICA, flow);
    let pages = paginate(lines, flow)
        .into_iter()
        .map(|page| PageLayout {
            clip: None,
            items: page.into_iter().map(PageItem::from).collect(),
        })
        .collect();

    DocumentLayout {
        page_width_mm: A4_WIDTH_MM,
        page_height_mm: A4_HEIGHT_MM,
        font: HELVETICA.name.to_string(),
        font_size_pt: flow.font_size_pt,
        pages,
    }
}

#[derive(Clone)]
pub struct PdfExporter {
    rasterizer: Arc<dyn Rasterizer>,
    author: Arc<dyn PdfAuthor>,
    settings: PdfSettings,
}

impl PdfExporter {
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        author: Arc<dyn PdfAuthor>,
        settings: PdfSettings,
    ) -> Self {
        Self {
            rasterizer,
            author,
            settings,
        }
    }

    pub async fn export(
        &self,
        preview: &PreviewDocument,
        profession: &str,
    ) -> Result<PdfOutcome, ExportError> {
        let filename = pdf_filename(profession);

        let (body, strategy) = match self.render_raster(preview).await {
            Ok(body) => (body, PdfStrategy::Raster),
            Err(primary) => {
                warn!(error = %primary, "Raster PDF failed, falling back to text");
                match self.render_text(preview).await {
                    Ok(body) => (body, PdfStrategy::TextFallback),
                    Err(fallback) => {
                        error!(error = %fallback, "Text PDF fallback failed");
                        return Err(ExportError::BothStrategiesFailed { primary, fallback });
                    }
                }
            }
        };

        info!(filename = %filename, ?strategy, bytes = body.len(), "PDF exported");
        Ok(PdfOutcome {
            file: ExportFile {
                filename,
                content_type: "application/pdf",
                body,
            },
            strategy,
        })
    }

    async fn render_raster(&self, preview: &PreviewDocument) -> Result<Bytes, ServiceError> {
        let s = &self.settings;
        let request = RasterRequest {
            markup: print_markup(preview, s),
            width_px: (s.container_width_mm * PX_PER_MM).round() as u32,
            scale: s.scale,
            background: s.background.clone(),
        };
        tokio::time::sleep(s.settle_delay).await;
        let bitmap = self.rasterizer.rasterize(&request).await?;
        let layout = raster_layout(&bitmap, s)?;
        self.author.author(&layout, Some(&bitmap)).await
    }

    async fn render_text(&self, preview: &PreviewDocument) -> Result<Bytes, ServiceError> {
        let layout = text_layout(preview, &self.settings);
        self.author.author(&layout, None).await
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::export::services::{
        Bitmap, DocumentLayout, PdfAuthor, RasterRequest, Rasterizer, ServiceError,
    };

    pub struct FakeRasterizer {
        pub fail: bool,
        pub width_px: u32,
        pub height_px: u32,
    }

    #[async_trait]
    impl Rasterizer for FakeRasterizer {
        async fn rasterize(&self, _request: &RasterRequest) -> Result<Bitmap, ServiceError> {
            if self.fail {
                return Err(ServiceError::Status {
                    service: "rasterizer",
                    status: 500,
                    message: "canvas crashed".into(),
                });
            }
            Ok(Bitmap {
                png: Bytes::from_static(b"\x89PNG"),
                width_px: self.width_px,
                height_px: self.height_px,
            })
        }
    }

    /// Records every layout it is asked to author.
    #[derive(Default)]
    pub struct FakeAuthor {
        pub fail: bool,
        pub calls: Mutex<Vec<(DocumentLayout, bool)>>,
    }

    #[async_trait]
    impl PdfAuthor for FakeAuthor {
        async fn author(
            &self,
            layout: &DocumentLayout,
            image: Option<&Bitmap>,
        ) -> Result<Bytes, ServiceError> {
            self.calls
                .lock()
                .unwrap()
                .push((layout.clone(), image.is_some()));
            if self.fail {
                return Err(ServiceError::Malformed {
                    service: "pdf-service",
                    reason: "down".into(),
                });
            }
            Ok(Bytes::from_static(b"%PDF-1.7 fake"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::{FakeAuthor, FakeRasterizer};
    use super::*;
    use crate::models::{FormState, SectionKind};
    use crate::preview::{compose, SectionGating};

    fn exporter(rasterizer: FakeRasterizer, author: Arc<FakeAuthor>) -> PdfExporter {
        PdfExporter::new(Arc::new(rasterizer), author, PdfSettings::default())
    }

    fn ok_rasterizer(height_px: u32) -> FakeRasterizer {
        FakeRasterizer {
            fail: false,
            width_px: 1900,
            height_px,
        }
    }

    #[test]
    fn test_pdf_filename() {
        assert_eq!(pdf_filename("Engineer"), "Engineer-resume.pdf");
        assert_eq!(pdf_filename(""), "portfolio-resume.pdf");
        assert_eq!(pdf_filename("CI/CD Lead"), "CICD Lead-resume.pdf");
    }

    #[test]
    fn test_raster_layout_single_page() {
        let bitmap = Bitmap {
            png: Bytes::new(),
            width_px: 1900,
            height_px: 1000,
        };
        let layout = raster_layout(&bitmap, &PdfSettings::default()).unwrap();
        assert_eq!(layout.pages.len(), 1);
        assert_eq!(
            layout.pages[0].items[0],
            PageItem::Image {
                x_mm: 10.0,
                y_mm: 10.0,
                width_mm: 190.0,
                height_mm: 100.0,
            }
        );
    }

    #[test]
    fn test_raster_layout_continues_tall_images() {
        // 190 mm wide at 10 px/mm: 6000 px → 600 mm → three 277 mm pages.
        let bitmap = Bitmap {
            png: Bytes::new(),
            width_px: 1900,
            height_px: 6000,
        };
        let layout = raster_layout(&bitmap, &PdfSettings::default()).unwrap();
        assert_eq!(layout.pages.len(), 3);
        let PageItem::Image { y_mm, .. } = &layout.pages[2].items[0] else {
            panic!("expected image item");
        };
        assert!((y_mm - (10.0 - 2.0 * 277.0)).abs() < 1e-3);
    }

    #[test]
    fn test_raster_pages_clip_to_printable_area() {
        let bitmap = Bitmap {
            png: Bytes::new(),
            width_px: 1900,
            height_px: 6000,
        };
        let layout = raster_layout(&bitmap, &PdfSettings::default()).unwrap();
        let expected = ClipRect {
            x_mm: 10.0,
            y_mm: 10.0,
            width_mm: 190.0,
            height_mm: 277.0,
        };
        for (k, page) in layout.pages.iter().enumerate() {
            assert_eq!(page.clip, Some(expected));
            let PageItem::Image { y_mm, .. } = &page.items[0] else {
                panic!("expected image item");
            };
            // the slice shown inside the clip starts where the previous page's ended
            let shown_from = expected.y_mm - y_mm;
            assert!((shown_from - k as f32 * expected.height_mm).abs() < 1e-3);
        }
    }

    #[test]
    fn test_raster_layout_rejects_empty_bitmap() {
        let bitmap = Bitmap {
            png: Bytes::new(),
            width_px: 0,
            height_px: 10,
        };
        assert!(raster_layout(&bitmap, &PdfSettings::default()).is_err());
    }

    #[test]
    fn test_print_markup_wraps_preview() {
        let preview = compose(&FormState::default(), SectionGating::default());
        let markup = print_markup(&preview, &PdfSettings::default());
        assert!(markup.starts_with(r#"<div style="width: 210mm; background: #ffffff;">"#));
        assert!(markup.contains("width: 190mm; padding: 20px;"));
        assert!(markup.contains("--primary-color: #4a6fa5;"));
        assert!(markup.contains(&preview.markup));
    }

    #[tokio::test(start_paused = true)]
    async fn test_raster_success() {
        let author = Arc::new(FakeAuthor::default());
        let preview = compose(&FormState::default(), SectionGating::default());
        let outcome = exporter(ok_rasterizer(1000), author.clone())
            .export(&preview, "Engineer")
            .await
            .unwrap();
        assert_eq!(outcome.strategy, PdfStrategy::Raster);
        assert_eq!(outcome.strategy.notice(), "PDF downloaded successfully!");
        assert_eq!(outcome.file.filename, "Engineer-resume.pdf");
        assert_eq!(outcome.file.content_type, "application/pdf");
        let calls = author.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1, "raster layout carries the bitmap");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rasterizer_failure_falls_back_to_multi_page_text() {
        let mut form = FormState::default();
        form.profile.profession = "Engineer".into();
        for i in 0..30 {
            if i > 0 {
                form = form.add_entry(SectionKind::Projects);
            }
            form = form
                .set_entry_field(SectionKind::Projects, i, "name", format!("Project {i}").into())
                .unwrap();
        }
        let preview = compose(&form, SectionGating::default());
        let author = Arc::new(FakeAuthor::default());
        let rasterizer = FakeRasterizer {
            fail: true,
            width_px: 0,
            height_px: 0,
        };

        let outcome = exporter(rasterizer, author.clone())
            .export(&preview, &form.profile.profession)
            .await
            .unwrap();

        assert_eq!(outcome.strategy, PdfStrategy::TextFallback);
        assert_eq!(outcome.strategy.notice(), "PDF downloaded (text version).");
        assert_eq!(outcome.file.filename, "Engineer-resume.pdf");

        let calls = author.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (layout, with_image) = &calls[0];
        assert!(!with_image);
        assert!(layout.pages.len() >= 2, "30 projects exceed one page of 38 lines");
        assert!(layout.pages.iter().all(|p| p.items.len() <= 38));
        let PageItem::Text { x_mm, y_mm, .. } = &layout.pages[1].items[0] else {
            panic!("expected text item");
        };
        assert_eq!((*x_mm, *y_mm), (10.0, 20.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_author_failure_also_triggers_fallback() {
        // The author fails for both attempts, so both strategies fail.
        let author = Arc::new(FakeAuthor {
            fail: true,
            ..Default::default()
        });
        let preview = compose(&FormState::default(), SectionGating::default());
        let err = exporter(ok_rasterizer(1000), author.clone())
            .export(&preview, "")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "PDF generation failed completely. Please use HTML download."
        );
        let calls = author.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].1);
        assert!(!calls[1].1);
    }
}
