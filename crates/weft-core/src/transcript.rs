//! Persistence convention for reasoning traces.
//!
//! An assistant turn's stored raw text may embed its reasoning trace between
//! a fixed sentinel pair: `<thinking>trace</thinking>\nanswer`. The backend
//! writes this form when a turn produced a trace; on session load the client
//! splits it back into `(reasoning, answer)`.
//!
//! Malformed embeddings (either sentinel missing, or the closing sentinel
//! before the opening one) are treated as plain answers with no reasoning
//! segment.

/// Opening sentinel for an embedded reasoning trace.
pub const THINKING_OPEN: &str = "<thinking>";

/// Closing sentinel for an embedded reasoning trace.
pub const THINKING_CLOSE: &str = "</thinking>";

/// Compose stored raw text from a reasoning trace and answer.
///
/// With an empty trace the answer is stored as-is.
#[must_use]
pub fn embed_reasoning(reasoning: &str, answer: &str) -> String {
    if reasoning.is_empty() {
        answer.to_string()
    } else {
        format!("{THINKING_OPEN}{reasoning}{THINKING_CLOSE}\n{answer}")
    }
}

/// Split stored raw text into `(reasoning, answer)`.
///
/// Splits on the first matching sentinel pair. The enclosed text is the
/// reasoning trace; the remainder (leading/trailing whitespace trimmed) is
/// the answer. Text without a complete pair is all answer.
#[must_use]
pub fn split_reasoning(raw: &str) -> (Option<String>, String) {
    let Some(open) = raw.find(THINKING_OPEN) else {
        return (None, raw.trim().to_string());
    };
    let trace_start = open + THINKING_OPEN.len();
    let Some(close_rel) = raw[trace_start..].find(THINKING_CLOSE) else {
        // Closing sentinel missing: conservatively treat the whole text
        // as answer rather than guessing where the trace ends.
        return (None, raw.trim().to_string());
    };
    let close = trace_start + close_rel;

    let reasoning = raw[trace_start..close].to_string();
    let mut answer = String::with_capacity(raw.len());
    answer.push_str(&raw[..open]);
    answer.push_str(&raw[close + THINKING_CLOSE.len()..]);

    (Some(reasoning), answer.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_plain_text_has_no_reasoning() {
        let (reasoning, answer) = split_reasoning("just an answer");
        assert_eq!(reasoning, None);
        assert_eq!(answer, "just an answer");
    }

    #[test]
    fn split_extracts_embedded_trace() {
        let raw = "<thinking>step 1 step 2</thinking>\nAnswer.";
        let (reasoning, answer) = split_reasoning(raw);
        assert_eq!(reasoning.as_deref(), Some("step 1 step 2"));
        assert_eq!(answer, "Answer.");
    }

    #[test]
    fn embed_then_split_roundtrips() {
        let raw = embed_reasoning("let me think", "The answer is 42.");
        let (reasoning, answer) = split_reasoning(&raw);
        assert_eq!(reasoning.as_deref(), Some("let me think"));
        assert_eq!(answer, "The answer is 42.");
    }

    #[test]
    fn embed_empty_trace_is_passthrough() {
        assert_eq!(embed_reasoning("", "hi"), "hi");
    }

    #[test]
    fn missing_close_sentinel_is_all_answer() {
        let raw = "<thinking>never closed... and some text";
        let (reasoning, answer) = split_reasoning(raw);
        assert_eq!(reasoning, None);
        assert_eq!(answer, raw);
    }

    #[test]
    fn lone_close_sentinel_is_all_answer() {
        let raw = "text with a stray </thinking> marker";
        let (reasoning, answer) = split_reasoning(raw);
        assert_eq!(reasoning, None);
        assert_eq!(answer, raw);
    }

    #[test]
    fn split_uses_first_matching_pair() {
        let raw = "<thinking>one</thinking>\nbody <thinking>two</thinking> tail";
        let (reasoning, answer) = split_reasoning(raw);
        assert_eq!(reasoning.as_deref(), Some("one"));
        assert_eq!(answer, "body <thinking>two</thinking> tail");
    }

    #[test]
    fn empty_trace_roundtrip_preserves_pair() {
        let (reasoning, answer) = split_reasoning("<thinking></thinking>\nhi");
        assert_eq!(reasoning.as_deref(), Some(""));
        assert_eq!(answer, "hi");
    }
}
