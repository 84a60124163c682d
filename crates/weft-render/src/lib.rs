//! Render pipeline for weft.
//!
//! Two independent pure transforms:
//!
//! - **Answer rendering**: raw markdown -> sanitized HTML -> code-block
//!   augmentation. See [`render_answer`].
//! - **Reasoning rendering**: raw text -> HTML-escaped display string with a
//!   character count. See [`render_reasoning`]. No markdown interpretation.
//!
//! Both are deterministic and hold no state between calls; callers re-render
//! the full accumulated text on every streaming event, so partial-markdown
//! artifacts (an unterminated fence, say) self-correct as more text arrives.

pub mod augment;
pub mod error;
pub mod markdown;
pub mod reasoning;

pub use augment::CodeBlock;
pub use error::RenderError;
pub use markdown::{render_answer, RenderedAnswer};
pub use reasoning::{render_reasoning, RenderedReasoning};
