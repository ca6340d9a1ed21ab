// Export Pipeline: standalone HTML and PDF (raster first, text-only fallback).
// Both formats read the compositor's preview, brought up to date first.

pub mod font_metrics;
pub mod handlers;
pub mod html;
pub mod pdf;
pub mod services;
pub mod text_flow;

use std::fmt::Write as _;

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

pub use html::export_html;
pub use pdf::{ExportError, PdfExporter, PdfSettings};

/// A finished download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Bytes,
}

impl ExportFile {
    /// `attachment` disposition with an ASCII fallback name plus the exact
    /// name in RFC 5987 form.
    pub fn content_disposition(&self) -> String {
        let fallback: String = self
            .filename
            .chars()
            .map(|c| {
                if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let mut encoded = String::new();
        for b in self.filename.bytes() {
            if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
                encoded.push(b as char);
            } else {
                let _ = write!(encoded, "%{b:02X}");
            }
        }
        format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
    }
}

impl IntoResponse for ExportFile {
    fn into_response(self) -> Response {
        let disposition = HeaderValue::from_str(&self.content_disposition())
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
        (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(self.content_type)),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.body,
        )
            .into_response()
    }
}

/// Drops characters that cannot appear in a file name on common platforms.
pub fn filename_safe(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && !r#"/\:*?"<>|"#.contains(*c))
        .collect::<String>()
        .trim()
        .to_string()
}
