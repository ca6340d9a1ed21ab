use std::sync::Arc;

use crate::export::PdfExporter;
use crate::session::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    /// Raster-first PDF export over the pluggable rasterizer and PDF author.
    pub pdf: Arc<PdfExporter>,
}

#[cfg(test)]
impl AppState {
    /// In-memory store and fake export services. `raster_fails` forces the
    /// text fallback.
    pub fn for_tests(raster_fails: bool) -> Self {
        Self::for_tests_with(raster_fails, false)
    }

    pub fn for_tests_with(raster_fails: bool, author_fails: bool) -> Self {
        use std::time::Duration;

        use crate::export::pdf::fakes::{FakeAuthor, FakeRasterizer};
        use crate::export::PdfSettings;
        use crate::session::SessionSettings;
        use crate::storage::MemoryStore;

        let rasterizer = FakeRasterizer {
            fail: raster_fails,
            width_px: 1588,
            height_px: 2000,
        };
        let author = FakeAuthor {
            fail: author_fails,
            ..FakeAuthor::default()
        };
        let settings = PdfSettings {
            settle_delay: Duration::ZERO,
            ..PdfSettings::default()
        };
        Self {
            sessions: Arc::new(SessionRegistry::new(
                Arc::new(MemoryStore::new()),
                SessionSettings::default(),
            )),
            pdf: Arc::new(PdfExporter::new(
                Arc::new(rasterizer),
                Arc::new(author),
                settings,
            )),
        }
    }
}
