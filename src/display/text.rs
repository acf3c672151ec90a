//! Line limiting, truncation and wrapping.
//!
//! Widths count characters, not bytes.

/// What to do with a line longer than the width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Leave it as is.
    Keep,
    /// Cut it and append the suffix.
    Truncate,
    /// Split it into several lines.
    Wrap,
}

/// Per-line formatting options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormat {
    /// Maximum line width; `None` disables all processing.
    pub width: Option<usize>,
    pub mode: Overflow,
    /// When wrapping, break after the last space in the window.
    pub wrap_space: bool,
    /// Appended to truncated lines.
    pub suffix: String,
    /// Prepended to wrapped continuation lines.
    pub prefix: String,
}

impl Default for LineFormat {
    fn default() -> Self {
        Self {
            width: Some(80),
            mode: Overflow::Keep,
            wrap_space: false,
            suffix: "...".to_string(),
            prefix: "_ ".to_string(),
        }
    }
}

/// Formatting errors
#[derive(Debug)]
pub enum FormatError {
    /// Input declared as JSON did not parse
    Json(serde_json::Error),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Json(e) => write!(f, "Invalid JSON: {}", e),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(e: serde_json::Error) -> Self {
        FormatError::Json(e)
    }
}

/// Format a single line (no `\n` inside) according to `fmt`.
pub fn process_line(line: &str, fmt: &LineFormat) -> Vec<String> {
    debug_assert!(!line.contains('\n'));

    let chars: Vec<char> = line.chars().collect();
    let width = match fmt.width {
        Some(width) if chars.len() > width => width,
        _ => return vec![line.to_string()],
    };

    match fmt.mode {
        Overflow::Keep => vec![line.to_string()],
        Overflow::Truncate => {
            let keep = width.saturating_sub(fmt.suffix.chars().count());
            let mut out: String = chars[..keep].iter().collect();
            out.push_str(&fmt.suffix);
            vec![out]
        }
        Overflow::Wrap => wrap(&chars, width, fmt).unwrap_or_else(|| vec![line.to_string()]),
    }
}

/// Wrap `chars` into pieces of at most `width` chars, keeping the indent.
///
/// Returns `None` when wrapping cannot make progress.
fn wrap(chars: &[char], width: usize, fmt: &LineFormat) -> Option<Vec<String>> {
    let indent = chars.iter().take_while(|&&c| c == ' ').count();
    let window = width.checked_sub(indent).filter(|&w| w > 0)?;
    let prefix: Vec<char> = fmt.prefix.chars().collect();
    if prefix.len() >= window {
        return None;
    }

    let pad = " ".repeat(indent);
    let mut rest: Vec<char> = chars[indent..].to_vec();
    // Continuation rounds start with the prefix; its spaces are not breaks.
    let mut lead = 0;
    let mut lines = Vec::new();

    while !rest.is_empty() {
        let mut end = window.min(rest.len());
        if fmt.wrap_space && rest.len() > end {
            // Break after the last space, unless it is the window's last char.
            if let Some(space) = rest[lead..window].iter().rposition(|&c| c == ' ') {
                let space = lead + space;
                if space + 1 < window && space > lead {
                    end = space;
                }
            }
        }

        let mut piece = pad.clone();
        piece.extend(&rest[..end]);
        lines.push(piece);

        let tail = &rest[end..];
        rest = if tail.is_empty() {
            Vec::new()
        } else {
            prefix.iter().chain(tail).copied().collect()
        };
        lead = prefix.len();
    }

    Some(lines)
}

/// Format multi-line text: at most `nlines` lines, each through `process_line`.
///
/// With `json_string` the text is parsed and re-serialized as pretty JSON
/// first. One trailing empty line is dropped.
pub fn format_text(
    text: &str,
    nlines: Option<usize>,
    fmt: &LineFormat,
    json_string: bool,
) -> Result<Vec<String>, FormatError> {
    let pretty;
    let text = if json_string {
        let value: serde_json::Value = serde_json::from_str(text)?;
        pretty = serde_json::to_string_pretty(&value)?;
        pretty.as_str()
    } else {
        text
    };

    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    let limit = nlines.map_or(lines.len(), |n| n.min(lines.len()));

    Ok(lines[..limit]
        .iter()
        .flat_map(|line| process_line(line, fmt))
        .collect())
}

/// First `nlines` lines of `text`, right-trimmed.
pub fn text_head(text: &str, nlines: Option<usize>) -> Vec<String> {
    text.split('\n')
        .take(nlines.unwrap_or(usize::MAX))
        .map(|line| line.trim_end().to_string())
        .collect()
}
