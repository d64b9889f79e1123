//! Content rendering.
//!
//! The index only needs a string to match queries against; how that string
//! is produced is up to the renderer.

use pulldown_cmark::{html, Options, Parser};

use crate::error::QuireError;

/// Turns a document body into displayable content.
pub trait ContentRenderer: Send + Sync {
    fn render(&self, body: &str) -> Result<String, QuireError>;
}

/// CommonMark to HTML with the usual GitHub-flavoured extensions.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownRenderer;

impl ContentRenderer for MarkdownRenderer {
    fn render(&self, body: &str) -> Result<String, QuireError> {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_HEADING_ATTRIBUTES;
        let parser = Parser::new_ext(body, options);

        let mut out = String::with_capacity(body.len() + body.len() / 2);
        html::push_html(&mut out, parser);
        Ok(out)
    }
}
