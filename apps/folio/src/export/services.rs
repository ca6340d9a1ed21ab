//! The two external collaborators of the PDF export: a rasterizer that turns
//! markup into a PNG bitmap, and a PDF author that assembles pages from a
//! layout description. Both sit behind traits so the exporter can be driven
//! by in-memory fakes in tests.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::text_flow::PlacedLine;

const MAX_ATTEMPTS: u32 = 2;
const RETRY_BASE_DELAY_MS: u64 = 250;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned status {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} returned a malformed response: {reason}")]
    Malformed {
        service: &'static str,
        reason: String,
    },

    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RasterRequest {
    pub markup: String,
    pub width_px: u32,
    pub scale: f32,
    pub background: String,
}

#[derive(Debug, Clone)]
pub struct Bitmap {
    pub png: Bytes,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageItem {
    /// Places the accompanying bitmap. `y_mm` may be negative on continuation
    /// pages, which shifts the image up by the height already shown.
    Image {
        x_mm: f32,
        y_mm: f32,
        width_mm: f32,
        height_mm: f32,
    },
    Text {
        x_mm: f32,
        y_mm: f32,
        text: String,
    },
}

impl From<PlacedLine> for PageItem {
    fn from(line: PlacedLine) -> Self {
        PageItem::Text {
            x_mm: line.x_mm,
            y_mm: line.y_mm,
            text: line.text,
        }
    }
}

/// Millimetre rectangle on the page, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClipRect {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    /// Nothing is painted outside this area when set. Continuation pages of a
    /// tall bitmap rely on it to hide the neighbouring slices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<ClipRect>,
    pub items: Vec<PageItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub font: String,
    pub font_size_pt: f32,
    pub pages: Vec<PageLayout>,
}

// ────────────────────────────────────────────────────────────────────────────
// Traits
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, request: &RasterRequest) -> Result<Bitmap, ServiceError>;
}

#[async_trait]
pub trait PdfAuthor: Send + Sync {
    /// Returns the finished PDF. `image` is present when the layout places a
    /// bitmap. A page's `clip` must be honoured for every item on it.
    async fn author(
        &self,
        layout: &DocumentLayout,
        image: Option<&Bitmap>,
    ) -> Result<Bytes, ServiceError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP implementations
// ────────────────────────────────────────────────────────────────────────────

fn build_client(timeout: Duration) -> Result<Client, ServiceError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Sends a request built by `send`, retrying once on transport errors, 429
/// and 5xx responses. Any other non-success status is returned as-is.
async fn send_with_retry<F, Fut>(service: &'static str, mut send: F) -> Result<Response, ServiceError>
where
    F: FnMut() -> Result<Fut, ServiceError>,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut last_error: Option<ServiceError> = None;

    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            let delay = Duration::from_millis(RETRY_BASE_DELAY_MS << (attempt - 1));
            warn!(service, attempt, "Retrying after {}ms", delay.as_millis());
            tokio::time::sleep(delay).await;
        }

        let response = match send()?.await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(ServiceError::Http(e));
                continue;
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        let err = ServiceError::Status {
            service,
            status: status.as_u16(),
            message,
        };
        if status.as_u16() == 429 || status.is_server_error() {
            warn!(service, status = status.as_u16(), "Upstream error");
            last_error = Some(err);
            continue;
        }
        return Err(err);
    }

    Err(last_error.unwrap_or(ServiceError::Malformed {
        service,
        reason: "no attempt was made".to_string(),
    }))
}

#[derive(Clone)]
pub struct HttpRasterizer {
    client: Client,
    url: String,
}

impl HttpRasterizer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

fn dimension_header(response: &Response, name: &str) -> Result<u32, ServiceError> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u32>().ok())
        .ok_or_else(|| ServiceError::Malformed {
            service: "rasterizer",
            reason: format!("missing or invalid {name} header"),
        })
}

#[async_trait]
impl Rasterizer for HttpRasterizer {
    async fn rasterize(&self, request: &RasterRequest) -> Result<Bitmap, ServiceError> {
        let response = send_with_retry("rasterizer", || {
            Ok(self.client.post(&self.url).json(request).send())
        })
        .await?;

        let width_px = dimension_header(&response, "x-bitmap-width")?;
        let height_px = dimension_header(&response, "x-bitmap-height")?;
        let png = response.bytes().await?;
        if png.is_empty() {
            return Err(ServiceError::Malformed {
                service: "rasterizer",
                reason: "empty body".to_string(),
            });
        }

        debug!(width_px, height_px, bytes = png.len(), "Rasterized preview");
        Ok(Bitmap {
            png,
            width_px,
            height_px,
        })
    }
}

#[derive(Clone)]
pub struct HttpPdfService {
    client: Client,
    url: String,
}

impl HttpPdfService {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PdfAuthor for HttpPdfService {
    async fn author(
        &self,
        layout: &DocumentLayout,
        image: Option<&Bitmap>,
    ) -> Result<Bytes, ServiceError> {
        let layout_json = serde_json::to_string(layout)?;

        let response = send_with_retry("pdf-service", || {
            let mut form = Form::new().text("layout", layout_json.clone());
            if let Some(bitmap) = image {
                let part = Part::bytes(bitmap.png.to_vec())
                    .file_name("page.png")
                    .mime_str("image/png")?;
                form = form.part("image", part);
            }
            Ok(self.client.post(&self.url).multipart(form).send())
        })
        .await?;

        let pdf = response.bytes().await?;
        if !pdf.starts_with(b"%PDF") {
            return Err(ServiceError::Malformed {
                service: "pdf-service",
                reason: "body is not a PDF document".to_string(),
            });
        }
        debug!(pages = layout.pages.len(), bytes = pdf.len(), "Authored PDF");
        Ok(pdf)
    }
}
