//! HTML report exporter backed by pulldown-cmark.
//!
//! Evaluation reports are GitHub-flavoured markdown with wide tables; the
//! exporter renders them into a single self-contained HTML page.

use async_trait::async_trait;
use pulldown_cmark::{html, Options, Parser};

use crate::ports::{ExportError, ReportExporter};

/// Markdown to HTML exporter.
///
/// ```rust,ignore
/// let exporter = HtmlReportExporter::new();
/// let page = exporter.to_html("# Evaluation Report", "invoice-42").await?;
/// ```
#[derive(Debug, Clone)]
pub struct HtmlReportExporter {
    include_default_css: bool,
}

impl Default for HtmlReportExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlReportExporter {
    pub fn new() -> Self {
        Self {
            include_default_css: true,
        }
    }

    /// Disable the built-in stylesheet.
    pub fn without_default_css(mut self) -> Self {
        self.include_default_css = false;
        self
    }

    fn wrap_html(&self, body: String, title: &str) -> String {
        let css = if self.include_default_css { REPORT_CSS } else { "" };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
    <main class="evaluation-report">
{body}
    </main>
</body>
</html>"#,
            title = html_escape(title),
            css = css,
            body = body
        )
    }
}

#[async_trait]
impl ReportExporter for HtmlReportExporter {
    async fn to_html(&self, markdown: &str, title: &str) -> Result<String, ExportError> {
        if markdown.trim().is_empty() {
            return Err(ExportError::EmptyReport("report is empty".to_string()));
        }

        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let parser = Parser::new_ext(markdown, options);

        let mut body = String::with_capacity(markdown.len() * 2);
        html::push_html(&mut body, parser);

        Ok(self.wrap_html(body, title))
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const REPORT_CSS: &str = r#"
body {
    font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif;
    font-size: 14px;
    line-height: 1.5;
    color: #1f2937;
    max-width: 1200px;
    margin: 0 auto;
    padding: 2rem;
}

h1 { border-bottom: 2px solid #2563eb; padding-bottom: 0.4rem; }
h2 { border-bottom: 1px solid #e5e7eb; margin-top: 2rem; }

table { border-collapse: collapse; width: 100%; margin: 1em 0; }
th, td { border: 1px solid #e5e7eb; padding: 0.35rem 0.5rem; text-align: left; vertical-align: top; }
th { background: #f3f4f6; }
tr:nth-child(even) { background: #f9fafb; }

blockquote {
    margin: 1em 0;
    padding: 0.5em 1em;
    border-left: 4px solid #dc2626;
    background: #fef2f2;
}

code { font-family: 'SF Mono', Consolas, monospace; font-size: 0.9em; }
"#;
