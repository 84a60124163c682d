//! Markdown to sanitized, augmented HTML.
//!
//! The answer renderer runs three stages:
//!
//! 1. Parse markdown with line-break-sensitive, GitHub-flavored semantics
//!    (tables, strikethrough, task lists; soft breaks become visible breaks).
//! 2. Sanitize the HTML against a fixed allow-list. The only two policy
//!    extensions over the default are the `target` attribute on links and
//!    the `<iframe>` element; `class` is additionally kept on `<code>` so
//!    fence language tokens survive into the augmentation stage.
//! 3. Wrap every fenced code block in a labeled container with a copy
//!    control (see [`crate::augment`]).

use pulldown_cmark::{html, Event, Options, Parser};

use crate::augment::{self, CodeBlock};

/// Result of rendering an answer: the final markup plus the plain-text
/// source of every code block, in document order, for the copy controls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedAnswer {
    /// Sanitized, augmented HTML.
    pub html: String,
    /// Copy payloads for each fenced code block, in document order. The
    /// `data-block` index on each copy control addresses into this list.
    pub code_blocks: Vec<CodeBlock>,
}

/// Render raw answer markdown to sanitized, augmented HTML.
///
/// Deterministic: the same raw text always produces the same markup. If the
/// augmentation stage hits structurally malformed markup it falls back to an
/// escaped plain-text rendering of the raw input instead of failing the turn.
#[must_use]
pub fn render_answer(raw: &str) -> RenderedAnswer {
    let sanitized = sanitize(&markdown_to_html(raw));

    match augment::augment_code_blocks(&sanitized) {
        Ok((html, code_blocks)) => RenderedAnswer { html, code_blocks },
        Err(e) => {
            tracing::warn!(error = %e, "code block augmentation failed, falling back to plain text");
            RenderedAnswer {
                html: format!("<pre>{}</pre>", ammonia::clean_text(raw)),
                code_blocks: Vec::new(),
            }
        }
    }
}

/// Parse markdown and emit HTML.
///
/// Soft breaks are promoted to hard breaks so single newlines stay visible,
/// matching how streamed chat answers are written.
fn markdown_to_html(raw: &str) -> String {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(raw, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(raw.len() * 2);
    html::push_html(&mut out, parser);
    out
}

/// Sanitize HTML against the fixed allow-list.
fn sanitize(html: &str) -> String {
    ammonia::Builder::default()
        .add_tag_attributes("a", &["target"])
        .add_tags(&["iframe"])
        .add_tag_attributes(
            "iframe",
            &["src", "width", "height", "frameborder", "allow", "allowfullscreen", "title"],
        )
        .add_tag_attributes("code", &["class"])
        .clean(html)
        .to_string()
}
