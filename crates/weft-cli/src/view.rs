//! Rendered conversation state.
//!
//! The view holds the ordered history of frozen turns for the active
//! session plus the single live (streaming) cell. Only the controller
//! mutates it while a turn is in flight; a session switch replaces the
//! history wholesale.

use weft_client::{Role, StoredMessage};
use weft_core::split_reasoning;
use weft_render::{render_answer, render_reasoning, CodeBlock, RenderedReasoning};

/// Placeholder shown while the first content event is awaited.
pub const PENDING_PLACEHOLDER: &str = "…";

/// Placeholder answer for a turn stopped before any text arrived.
pub const STOPPED_PLACEHOLDER: &str = "Generation stopped.";

/// How a frozen assistant turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn completed normally.
    Completed,
    /// The turn was stopped mid-generation.
    Stopped,
    /// Generation failed.
    Failed,
}

/// One frozen turn in the history.
#[derive(Debug, Clone)]
pub struct RenderedTurn {
    /// Who spoke.
    pub role: Role,
    /// The turn's raw text (persisted form for assistant turns).
    pub raw_text: String,
    /// Answer markup.
    pub answer_html: String,
    /// Code blocks extracted from the answer, in document order.
    pub code_blocks: Vec<CodeBlock>,
    /// Reasoning trace, when the turn carried one.
    pub reasoning: Option<RenderedReasoning>,
    /// Backend-reported generation duration in seconds.
    pub duration: Option<f64>,
    /// How the turn ended. User turns are always `Completed`.
    pub outcome: TurnOutcome,
}

impl RenderedTurn {
    /// Build a user turn, final on arrival.
    #[must_use]
    pub fn user(text: &str) -> Self {
        Self {
            role: Role::User,
            raw_text: text.to_string(),
            answer_html: format!("<p>{}</p>", escape(text)),
            code_blocks: Vec::new(),
            reasoning: None,
            duration: None,
            outcome: TurnOutcome::Completed,
        }
    }
}

/// The in-flight assistant cell.
#[derive(Debug, Clone, Default)]
pub struct LiveCell {
    /// Latest full re-render of the accumulated answer.
    pub answer_html: String,
    /// Reasoning panel content; `Some` reveals the panel.
    pub reasoning: Option<RenderedReasoning>,
    /// Transient status line (tool activity, stop acknowledgment).
    pub status: Option<String>,
}

impl LiveCell {
    fn pending() -> Self {
        Self {
            answer_html: format!("<p>{PENDING_PLACEHOLDER}</p>"),
            reasoning: None,
            status: None,
        }
    }

    /// Label for the reasoning panel while streaming.
    #[must_use]
    pub fn reasoning_label(&self) -> Option<String> {
        self.reasoning
            .as_ref()
            .map(|r| format!("Thinking… ({} chars)", r.char_count))
    }
}

/// Ordered history plus the live cell.
#[derive(Debug, Clone, Default)]
pub struct ConversationView {
    turns: Vec<RenderedTurn>,
    live: Option<LiveCell>,
}

impl ConversationView {
    /// Empty view with no live cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frozen turns in backend order.
    #[must_use]
    pub fn turns(&self) -> &[RenderedTurn] {
        &self.turns
    }

    /// The live cell, when a turn is streaming.
    #[must_use]
    pub const fn live(&self) -> Option<&LiveCell> {
        self.live.as_ref()
    }

    /// Append a frozen user turn.
    pub fn push_user(&mut self, text: &str) {
        self.turns.push(RenderedTurn::user(text));
    }

    /// Show the pending placeholder for a turn that just started.
    pub fn begin_live(&mut self) {
        self.live = Some(LiveCell::pending());
    }

    /// Replace the live answer markup.
    pub fn update_live_answer(&mut self, html: String) {
        if let Some(live) = &mut self.live {
            live.answer_html = html;
        }
    }

    /// Replace the live reasoning panel, revealing it on first content.
    pub fn update_live_reasoning(&mut self, reasoning: RenderedReasoning) {
        if let Some(live) = &mut self.live {
            live.reasoning = Some(reasoning);
        }
    }

    /// Set the transient status line on the live cell.
    pub fn set_live_status(&mut self, status: impl Into<String>) {
        if let Some(live) = &mut self.live {
            live.status = Some(status.into());
        }
    }

    /// Freeze the live cell into the history.
    pub fn freeze(&mut self, turn: RenderedTurn) {
        self.live = None;
        self.turns.push(turn);
    }

    /// Remove the most recent assistant turn, if the history ends with one.
    ///
    /// Returns whether a turn was removed.
    pub fn drop_last_assistant(&mut self) -> bool {
        if matches!(self.turns.last(), Some(t) if t.role == Role::Assistant) {
            self.turns.pop();
            true
        } else {
            false
        }
    }

    /// Rebuild the history from a session's stored messages.
    ///
    /// Assistant raw text is split on the transcript convention; both parts
    /// go through the render pipeline. Backend order is preserved.
    pub fn hydrate(&mut self, messages: &[StoredMessage]) {
        self.live = None;
        self.turns = messages
            .iter()
            .map(|msg| match msg.role {
                Role::User => RenderedTurn::user(&msg.content),
                Role::Assistant => {
                    let (reasoning, answer) = split_reasoning(&msg.content);
                    let rendered = render_answer(&answer);
                    RenderedTurn {
                        role: Role::Assistant,
                        raw_text: msg.content.clone(),
                        answer_html: rendered.html,
                        code_blocks: rendered.code_blocks,
                        reasoning: reasoning.as_deref().map(render_reasoning),
                        duration: msg.duration,
                        outcome: TurnOutcome::Completed,
                    }
                }
            })
            .collect();
    }

    /// Render the whole history as a standalone HTML document.
    #[must_use]
    pub fn to_html_document(&self, title: &str) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>");
        out.push_str(&escape(title));
        out.push_str("</title>\n</head>\n<body>\n");
        for turn in &self.turns {
            let class = match turn.role {
                Role::User => "turn turn-user",
                Role::Assistant => "turn turn-assistant",
            };
            out.push_str(&format!("<section class=\"{class}\">\n"));
            if let Some(reasoning) = &turn.reasoning {
                out.push_str(&format!(
                    "<details class=\"reasoning\"><summary>Reasoning ({} chars)</summary><pre>{}</pre></details>\n",
                    reasoning.char_count, reasoning.html
                ));
            }
            out.push_str(&turn.answer_html);
            out.push('\n');
            match turn.outcome {
                TurnOutcome::Completed => {
                    if let Some(duration) = turn.duration {
                        out.push_str(&format!("<footer>{duration:.1}s</footer>\n"));
                    }
                }
                TurnOutcome::Stopped => out.push_str("<footer>stopped</footer>\n"),
                TurnOutcome::Failed => out.push_str("<footer>failed</footer>\n"),
            }
            out.push_str("</section>\n");
        }
        out.push_str("</body>\n</html>\n");
        out
    }
}

/// HTML-escape plain text for interpolation into markup.
#[must_use]
pub fn escape(text: &str) -> String {
    render_reasoning(text).html
}
