//! Report Adapters.
//!
//! - `HtmlReportExporter` - Markdown to HTML using pulldown-cmark

mod html_exporter;

pub use html_exporter::HtmlReportExporter;
