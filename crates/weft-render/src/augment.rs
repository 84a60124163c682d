//! Code-block augmentation.
//!
//! Walks the sanitized HTML and wraps every `<pre><code>` block in a
//! container carrying a header: the declared language (from a `language-*`
//! class token, `"code"` when absent) and a copy control. The copy payload
//! is the block's entity-decoded plain source text, so what the user copies
//! is exactly the block's rendered text.

use crate::error::RenderError;

/// One fenced code block extracted during augmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language label shown in the header (`"code"` when the fence had none).
    pub language: String,
    /// Entity-decoded plain source text; the copy payload.
    pub source: String,
}

const BLOCK_OPEN: &str = "<pre><code";
const BLOCK_CLOSE: &str = "</code></pre>";

/// Wrap each code block in a labeled container and collect copy payloads.
///
/// # Errors
///
/// Returns an error if a block's markup is structurally malformed (an
/// unterminated tag or a missing closing pair). Sanitized input is always
/// well-formed, so this only fires on corrupted markup.
pub fn augment_code_blocks(html: &str) -> Result<(String, Vec<CodeBlock>), RenderError> {
    let mut out = String::with_capacity(html.len() + 128);
    let mut blocks = Vec::new();
    let mut rest = html;

    while let Some(start) = rest.find(BLOCK_OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + BLOCK_OPEN.len()..];

        let tag_end = after_open.find('>').ok_or(RenderError::UnterminatedTag)?;
        let attrs = &after_open[..tag_end];
        let body_and_rest = &after_open[tag_end + 1..];

        let body_end = body_and_rest
            .find(BLOCK_CLOSE)
            .ok_or(RenderError::UnterminatedBlock)?;
        let body = &body_and_rest[..body_end];

        let language = language_from_attrs(attrs);
        let index = blocks.len();
        push_wrapped(&mut out, &language, index, attrs, body);
        blocks.push(CodeBlock {
            language,
            source: decode_entities(body),
        });

        rest = &body_and_rest[body_end + BLOCK_CLOSE.len()..];
    }
    out.push_str(rest);

    Ok((out, blocks))
}

/// Emit the wrapped form of one code block.
fn push_wrapped(out: &mut String, language: &str, index: usize, attrs: &str, body: &str) {
    out.push_str("<div class=\"code-block\"><div class=\"code-block-header\"><span class=\"code-block-lang\">");
    out.push_str(&ammonia::clean_text(language));
    out.push_str("</span><button class=\"code-block-copy\" data-block=\"");
    out.push_str(&index.to_string());
    out.push_str("\">Copy</button></div><pre><code");
    out.push_str(attrs);
    out.push('>');
    out.push_str(body);
    out.push_str("</code></pre></div>");
}

/// Extract the language label from a code tag's attribute text.
fn language_from_attrs(attrs: &str) -> String {
    let Some(class_start) = attrs.find("class=\"") else {
        return "code".to_string();
    };
    let value = &attrs[class_start + "class=\"".len()..];
    let Some(class_end) = value.find('"') else {
        return "code".to_string();
    };

    value[..class_end]
        .split_ascii_whitespace()
        .find_map(|token| token.strip_prefix("language-"))
        .filter(|lang| !lang.is_empty())
        .map_or_else(|| "code".to_string(), str::to_string)
}

/// Decode the HTML entities the sanitizer emits in text content.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match decode_one_entity(tail) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode a single entity at the start of `tail` (which begins with `&`).
/// Returns the decoded char and the number of bytes consumed.
fn decode_one_entity(tail: &str) -> Option<(char, usize)> {
    const NAMED: &[(&str, char)] = &[
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&#39;", '\''),
        ("&#x27;", '\''),
        ("&apos;", '\''),
        ("&amp;", '&'),
    ];

    for (name, ch) in NAMED {
        if tail.starts_with(name) {
            return Some((*ch, name.len()));
        }
    }

    // Numeric entity: &#NN; or &#xHH;
    let body = tail.strip_prefix("&#")?;
    let semi = body.find(';')?;
    let digits = &body[..semi];
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|ch| (ch, 2 + semi + 1))
}
