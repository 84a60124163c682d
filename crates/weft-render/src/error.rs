//! Render pipeline errors.

use thiserror::Error;

/// Errors from the code-block augmentation scan.
///
/// These only arise on structurally malformed markup; the pipeline recovers
/// by falling back to escaped plain text, so callers of [`crate::render_answer`]
/// never see them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A `<code>` opening tag was never closed with `>`.
    #[error("unterminated code tag")]
    UnterminatedTag,

    /// A code block was opened but its closing `</code></pre>` is missing.
    #[error("unterminated code block")]
    UnterminatedBlock,
}
