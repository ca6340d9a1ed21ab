//! Text-only page flow for the PDF fallback: greedy word wrap against the
//! Helvetica metrics, then fixed-pitch placement down A4 pages.

use serde::Serialize;

use super::font_metrics::{FontMetricTable, MM_PER_PT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextFlowSettings {
    pub font_size_pt: f32,
    pub wrap_width_mm: f32,
    pub left_mm: f32,
    pub top_mm: f32,
    pub line_height_mm: f32,
    /// A line whose baseline would fall below this starts a new page.
    pub bottom_limit_mm: f32,
}

impl Default for TextFlowSettings {
    fn default() -> Self {
        Self {
            font_size_pt: 11.0,
            wrap_width_mm: 180.0,
            left_mm: 10.0,
            top_mm: 20.0,
            line_height_mm: 7.0,
            bottom_limit_mm: 280.0,
        }
    }
}

impl TextFlowSettings {
    /// Lines that fit between `top_mm` and `bottom_limit_mm` (38 by default).
    pub fn lines_per_page(&self) -> usize {
        ((self.bottom_limit_mm - self.top_mm) / self.line_height_mm).floor() as usize + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLine {
    pub x_mm: f32,
    pub y_mm: f32,
    pub text: String,
}

/// Wraps each paragraph to the configured width. Words wider than a whole
/// line are split between characters.
pub fn wrap_paragraphs(
    paragraphs: &[String],
    metrics: &FontMetricTable,
    settings: &TextFlowSettings,
) -> Vec<String> {
    let max_em = settings.wrap_width_mm / (settings.font_size_pt * MM_PER_PT);
    let space = metrics.space_width();
    let mut out = Vec::new();

    for paragraph in paragraphs {
        let mut line = String::new();
        let mut width = 0.0_f32;

        for word in paragraph.split_whitespace() {
            for piece in split_long_word(word, metrics, max_em) {
                let piece_w = metrics.measure_str(&piece);
                if line.is_empty() {
                    line = piece;
                    width = piece_w;
                } else if width + space + piece_w > max_em {
                    out.push(std::mem::take(&mut line));
                    line = piece;
                    width = piece_w;
                } else {
                    line.push(' ');
                    line.push_str(&piece);
                    width += space + piece_w;
                }
            }
        }
        if !line.is_empty() {
            out.push(line);
        }
    }
    out
}

fn split_long_word(word: &str, metrics: &FontMetricTable, max_em: f32) -> Vec<String> {
    if metrics.measure_str(word) <= max_em {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0_f32;
    for c in word.chars() {
        let w = metrics.char_width(c);
        if !piece.is_empty() && width + w > max_em {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Places wrapped lines top to bottom, opening a new page whenever the next
/// baseline would pass the bottom limit. Always yields at least one page.
pub fn paginate(lines: Vec<String>, settings: &TextFlowSettings) -> Vec<Vec<PlacedLine>> {
    let per_page = settings.lines_per_page().max(1);
    let mut pages: Vec<Vec<PlacedLine>> = Vec::new();
    for (i, text) in lines.into_iter().enumerate() {
        let row = i % per_page;
        if row == 0 {
            pages.push(Vec::with_capacity(per_page));
        }
        if let Some(page) = pages.last_mut() {
            page.push(PlacedLine {
                x_mm: settings.left_mm,
                y_mm: settings.top_mm + row as f32 * settings.line_height_mm,
                text,
            });
        }
    }
    if pages.is_empty() {
        pages.push(Vec::new());
    }
    pages
}
