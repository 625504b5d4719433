//! Line-level markdown helpers.
//!
//! These recognize just enough markdown for the entry template: ATX headings, fenced code blocks,
//! inline `[label](target)` links, and bold field labels. Everything is byte-offset aware so the
//! index updater can splice sections without touching surrounding text.

/// One line of a document with its byte offset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SourceLine<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Byte offset of the first character of the line.
    pub start: usize,
    /// Byte offset just past the line terminator (or end of text).
    pub end: usize,
    /// Line text without the `\n` / `\r\n` terminator.
    pub text: &'a str,
}

/// Split `text` into lines, keeping byte offsets.
pub fn source_lines(text: &str) -> Vec<SourceLine<'_>> {
    let mut out = Vec::new();
    let mut start = 0usize;
    for (idx, raw) in text.split_inclusive('\n').enumerate() {
        let end = start + raw.len();
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        let line = line.strip_suffix('\r').unwrap_or(line);
        out.push(SourceLine {
            number: idx + 1,
            start,
            end,
            text: line,
        });
        start = end;
    }
    out
}

/// Opening or closing code fence.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fence {
    /// Fence character (`` ` `` or `~`).
    pub marker: char,
    /// Length of the fence run.
    pub len: usize,
    /// First word after the fence, if any.
    pub lang: Option<String>,
}

/// Parse a fence line such as ```` ```rust ```` or `~~~`.
pub fn parse_fence_lang(line: &str) -> Option<Fence> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    let rest = trimmed[len..].trim();
    if marker == '`' && rest.contains('`') {
        return None;
    }
    let lang = rest
        .split_whitespace()
        .next()
        .filter(|word| !word.is_empty())
        .map(str::to_string);
    Some(Fence { marker, len, lang })
}

/// Whether `line` closes the fence opened by `open`.
pub fn closes_fence(open: &Fence, line: &str) -> bool {
    match parse_fence_lang(line) {
        Some(close) => close.marker == open.marker && close.len >= open.len && close.lang.is_none(),
        None => false,
    }
}

/// Tracks whether iteration is inside a fenced code block.
#[derive(Debug, Default)]
pub struct FenceTracker {
    open: Option<Fence>,
}

impl FenceTracker {
    /// Whether a fence is currently open.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Feed the next line; returns `true` when the line is fence syntax or fenced content.
    pub fn consume(&mut self, line: &str) -> bool {
        match &self.open {
            Some(open) => {
                if closes_fence(open, line) {
                    self.open = None;
                }
                true
            }
            None => {
                if let Some(fence) = parse_fence_lang(line) {
                    self.open = Some(fence);
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Parse an ATX heading into `(level, text)`.
pub fn parse_markdown_heading_parts(line: &str) -> Option<(usize, &str)> {
    let bytes = line.as_bytes();
    let mut count = 0usize;
    while count < bytes.len() && bytes[count] == b'#' {
        count += 1;
    }
    if count == 0 || count > 6 {
        return None;
    }
    match bytes.get(count) {
        None => Some((count, "")),
        Some(b) if b.is_ascii_whitespace() => Some((count, line[count..].trim())),
        Some(_) => None,
    }
}

/// First inline `[label](target)` link on a line.
///
/// Brackets nest inside the label and parentheses nest inside the target, so
/// `[Array[T]](https://x.test/a_(b))` keeps both intact. Backslash escapes are skipped.
pub fn first_inline_link(line: &str) -> Option<(&str, &str)> {
    let bytes = line.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'[' || (i > 0 && bytes[i - 1] == b'!') {
            i += 1;
            continue;
        }
        let Some(label_end) = find_closing(bytes, b'[', b']', i + 1) else {
            i += 1;
            continue;
        };
        if bytes.get(label_end + 1) != Some(&b'(') {
            i = label_end + 1;
            continue;
        }
        let Some(target_end) = find_closing(bytes, b'(', b')', label_end + 2) else {
            i = label_end + 1;
            continue;
        };
        let label = line[i + 1..label_end].trim();
        let mut target = line[label_end + 2..target_end].trim();
        if target.starts_with('<') && target.ends_with('>') && target.len() >= 2 {
            target = &target[1..target.len() - 1];
        }
        return Some((label, target));
    }

    None
}

/// Index of the `close` byte that balances an already-consumed `open`.
fn find_closing(bytes: &[u8], open: u8, close: u8, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split a `**Label:** value` line into label and value.
///
/// Returns `None` for lines that do not start with a bold label ending in a colon.
pub fn parse_field_label(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start().strip_prefix("**")?;
    let close = rest.find("**")?;
    let label = rest[..close].strip_suffix(':')?;
    if label.is_empty() {
        return None;
    }
    Some((label.trim(), rest[close + 2..].trim()))
}

/// Bullet item text for `- `, `* `, `+ `, or `N. ` list lines.
pub fn parse_list_item(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    for marker in ["- ", "* ", "+ "] {
        if let Some(item) = trimmed.strip_prefix(marker) {
            return Some(item.trim());
        }
    }
    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        if let Some(item) = trimmed[digits..].strip_prefix(". ") {
            return Some(item.trim());
        }
    }
    None
}
