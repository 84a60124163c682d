//! Reasoning-trace rendering.
//!
//! The reasoning panel shows the model's intermediate deliberation as plain
//! text: HTML-escaped, no markdown interpretation. The whole accumulated
//! buffer is re-rendered on every event (cheap, it is plain text).

/// Rendered reasoning trace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedReasoning {
    /// HTML-escaped display text.
    pub html: String,
    /// Running character count of the raw trace.
    pub char_count: usize,
}

/// Escape a raw reasoning trace for display.
#[must_use]
pub fn render_reasoning(raw: &str) -> RenderedReasoning {
    RenderedReasoning {
        html: ammonia::clean_text(raw),
        char_count: raw.chars().count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_counts_chars() {
        let rendered = render_reasoning("step 1 step 2");
        assert_eq!(rendered.char_count, 13);
        assert_eq!(rendered.html, "step 1 step 2");
    }

    #[test]
    fn markup_is_escaped_not_interpreted() {
        let rendered = render_reasoning("<script>alert(1)</script> **not bold**");
        assert!(!rendered.html.contains('<'));
        assert!(rendered.html.contains("**not bold**"));
    }

    #[test]
    fn char_count_is_chars_not_bytes() {
        let rendered = render_reasoning("思考中");
        assert_eq!(rendered.char_count, 3);
    }

    #[test]
    fn empty_trace() {
        let rendered = render_reasoning("");
        assert_eq!(rendered.char_count, 0);
        assert!(rendered.html.is_empty());
    }
}
