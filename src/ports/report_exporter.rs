//! Report Exporter Port - Renders markdown reports for browsers.

use async_trait::async_trait;
use thiserror::Error;

/// Renders a markdown report as a standalone document.
#[async_trait]
pub trait ReportExporter: Send + Sync {
    /// Full HTML page with `title` in the head.
    async fn to_html(&self, markdown: &str, title: &str) -> Result<String, ExportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("nothing to export: {0}")]
    EmptyReport(String),
}
