//! Report export use-case.
//!
//! # Responsibility
//! - Run one renderer and turn its result into a user-facing outcome.
//!
//! # Invariants
//! - `export` never returns an error value or panics; failures become an
//!   outcome with `path == None` and a readable message.

use crate::report::{renderer_for, ReportData, ReportFormat, ReportRenderer};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of one export attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOutcome {
    /// Written file on success.
    pub path: Option<PathBuf>,
    pub message: String,
}

impl ExportOutcome {
    pub fn is_success(&self) -> bool {
        self.path.is_some()
    }
}

/// Export facade over the report backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Renders `data` in `format` to `path`.
    pub fn export(&self, format: ReportFormat, data: &ReportData, path: &Path) -> ExportOutcome {
        let renderer = renderer_for(format);
        self.export_with(renderer.as_ref(), data, path)
    }

    /// Renders with an explicit backend.
    pub fn export_with(
        &self,
        renderer: &dyn ReportRenderer,
        data: &ReportData,
        path: &Path,
    ) -> ExportOutcome {
        let started_at = Instant::now();
        let format = renderer.format();
        match renderer.render(data, path) {
            Ok(()) => {
                info!(
                    "event=export module=service status=ok format={} path={} duration_ms={}",
                    format,
                    path.display(),
                    started_at.elapsed().as_millis()
                );
                ExportOutcome {
                    path: Some(path.to_path_buf()),
                    message: format!("{} report written to {}", format, path.display()),
                }
            }
            Err(err) => {
                warn!(
                    "event=export module=service status=error format={} path={} error={}",
                    format,
                    path.display(),
                    err
                );
                ExportOutcome {
                    path: None,
                    message: format!("could not export {format} report: {err}"),
                }
            }
        }
    }
}
