//! Markdown escaping and code-fence sizing.

/// Escape characters that would otherwise start Markdown syntax.
///
/// Emphasis, code, link brackets, table pipes and raw-HTML angle brackets are
/// always escaped; `#` and `>` only at the start of a line, and `!` only
/// when it would begin an image.
///
/// ```
/// use hengban::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("*重點*"), "\\*重點\\*");
/// assert_eq!(escape_markdown("C# 入門"), "C# 入門");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut chars = text.chars().peekable();
    let mut at_line_start = true;

    while let Some(c) = chars.next() {
        let escape = match c {
            '\\' | '*' | '_' | '`' | '[' | ']' | '|' | '<' => true,
            '#' | '>' => at_line_start,
            '!' => chars.peek() == Some(&'['),
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(c);
        at_line_start = c == '\n';
    }

    out
}

fn longest_run(content: &str, target: char) -> usize {
    content
        .chars()
        .fold((0usize, 0usize), |(max, run), c| {
            if c == target {
                (max.max(run + 1), run + 1)
            } else {
                (max, 0)
            }
        })
        .0
}

/// Backtick fence length for a code block: at least three, and longer than
/// any backtick run inside `content`.
pub fn calculate_fence_length(content: &str) -> usize {
    longest_run(content, '`').max(2) + 1
}

/// Backtick count for an inline code span.
pub fn calculate_inline_code_ticks(content: &str) -> usize {
    longest_run(content, '`') + 1
}
