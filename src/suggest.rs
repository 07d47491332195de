//! Shorthand for GitHub suggested changes.
//!
//! `[SUGGEST: code]` and `[SUGGEST:+2: code]` expand inline, a
//! `<<<SUGGEST` ... `SUGGEST>>>` block expands the lines between the
//! markers. Both become a fenced `suggestion` block.

const INLINE_OPEN: &str = "[SUGGEST:";
const BLOCK_OPEN: &str = "<<<SUGGEST";
const BLOCK_CLOSE: &str = "\nSUGGEST>>>";
const MAX_OFFSET: i32 = 999;

/// Expand every suggestion marker in `message`; text without markers is
/// returned unchanged.
pub fn expand_suggestions(message: &str) -> String {
    expand_inline(&expand_blocks(message))
}

fn suggestion_block(offset: i32, code: &str) -> String {
    if offset == 0 {
        format!("\n\n```suggestion\n{}\n```\n\n", code)
    } else {
        format!("\n\n```suggestion:{:+}\n{}\n```\n\n", offset, code)
    }
}

fn expand_blocks(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(start) = rest.find(BLOCK_OPEN) {
        let after = &rest[start + BLOCK_OPEN.len()..];
        let Some(newline) = after.find('\n') else {
            break;
        };
        if !after[..newline].trim().is_empty() {
            // "<<<SUGGESTION" and friends are ordinary text
            out.push_str(&rest[..start + BLOCK_OPEN.len()]);
            rest = after;
            continue;
        }
        let code = &after[newline + 1..];
        let Some(end) = code.find(BLOCK_CLOSE) else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&suggestion_block(0, code[..end].trim()));
        rest = &code[end + BLOCK_CLOSE.len()..];
    }
    out.push_str(rest);
    out
}

fn expand_inline(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(start) = rest.find(INLINE_OPEN) {
        let content_start = start + INLINE_OPEN.len();
        let Some(len) = closing_bracket(&rest[content_start..]) else {
            break;
        };
        let (offset, code) = split_offset(rest[content_start..content_start + len].trim());
        out.push_str(&rest[..start]);
        out.push_str(&suggestion_block(offset, code));
        rest = &rest[content_start + len + 1..];
    }
    out.push_str(rest);
    out
}

/// Byte index of the `]` closing the marker; nested brackets are skipped.
fn closing_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => return Some(i),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// `N: code` with an optional sign; out-of-range or malformed offsets
/// leave the whole content as code.
fn split_offset(content: &str) -> (i32, &str) {
    let Some((head, code)) = content.split_once(':') else {
        return (0, content);
    };
    let digits = head.strip_prefix(['+', '-']).unwrap_or(head);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || code.contains('\n') {
        return (0, content);
    }
    match head.parse::<i32>() {
        Ok(offset) if (-MAX_OFFSET..=MAX_OFFSET).contains(&offset) => (offset, code.trim()),
        _ => (0, content),
    }
}
