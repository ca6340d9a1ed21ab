// Preview Compositor: a pure projection of the form state into portfolio
// markup plus the statistics shown under the preview pane.
// Text extraction over the rendered markup lives in `text` and is shared with
// the PDF fallback.

pub mod compositor;
pub mod text;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use compositor::compose;

/// Decides whether a repeatable section appears in the preview at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionGating {
    /// The section is shown only when its first entry has its primary field
    /// filled in. Later entries alone never bring a section into view.
    #[default]
    RepresentativeEntry,
    /// The section is shown when any entry has something to render.
    AnyEntry,
}

impl FromStr for SectionGating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "representative" | "representative-entry" => Ok(SectionGating::RepresentativeEntry),
            "any" | "any-entry" => Ok(SectionGating::AnyEntry),
            other => Err(format!("unknown section gating policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewStats {
    /// `.portfolio-section` blocks plus one for the header.
    pub sections: usize,
    pub words: usize,
    /// Display name of the selected template.
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewDocument {
    pub markup: String,
    pub stats: PreviewStats,
    /// Presentation properties for the element hosting `markup`.
    pub container_style: String,
}
