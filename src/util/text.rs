use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

fn markup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static markup regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static whitespace regex"))
}

/// Turns a feed description into a plain-text snippet.
///
/// Every markup tag is replaced by a single space, then runs of whitespace
/// are collapsed and the result is trimmed. Entities are left as-is: the XML
/// layer has already unescaped one level.
///
/// ```
/// use newsquiz::util::clean_snippet;
///
/// assert_eq!(
///     clean_snippet("<p>Trains <b>cancelled</b></p>\n\n<p>again</p>"),
///     "Trains cancelled again"
/// );
/// ```
pub fn clean_snippet(s: &str) -> String {
    let stripped = markup_re().replace_all(s, " ");
    whitespace_re().replace_all(&stripped, " ").trim().to_string()
}

/// Keeps only ASCII word characters (`[A-Za-z0-9_]`) and hyphens.
///
/// Used to turn a headline word into a fill-in-the-blank answer, so
/// `"Thames,"` becomes `"Thames"` and `"£2m"` becomes `"2m"`.
pub fn clean_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Ellipsis string used for truncation
const ELLIPSIS: &str = "...";
/// Display width of the ellipsis (3 columns for ASCII "...")
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates a string to fit within a maximum display width.
///
/// If truncation is necessary, appends "..." to indicate text was cut off.
/// Uses Unicode-aware width calculation so CJK characters and emoji in
/// headlines never push a line past the terminal edge.
///
/// Returns `Cow::Borrowed` when the string already fits. For widths of 3 or
/// less there is no room for an ellipsis, so as many characters as fit are
/// returned on their own.
///
/// ```
/// use newsquiz::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    if UnicodeWidthStr::width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    // Width too narrow to fit char + ellipsis
    if max_width <= ELLIPSIS_WIDTH {
        let mut byte_end = 0;
        let mut current_width = 0;
        for (idx, c) in s.char_indices() {
            let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
            if current_width + char_width > max_width {
                break;
            }
            current_width += char_width;
            byte_end = idx + c.len_utf8();
        }
        return Cow::Owned(s[..byte_end].to_string());
    }

    let target_width = max_width - ELLIPSIS_WIDTH;
    let mut current_width = 0;
    let mut cut = s.len();
    for (idx, c) in s.char_indices() {
        let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
        if current_width + char_width > target_width {
            cut = idx;
            break;
        }
        current_width += char_width;
    }

    Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
}

/// SEC-001: Strip terminal control characters and ANSI escape sequences from text.
///
/// Headlines, snippets and source names come straight from remote feeds and
/// are printed to the terminal, so anything that could move the cursor,
/// recolour output or set the window title is removed.
///
/// Strips:
/// - ASCII control chars: 0x00-0x08, 0x0B-0x0C, 0x0E-0x1F, 0x7F
/// - ANSI CSI sequences: `\x1b[` ... (terminal byte 0x40-0x7E)
/// - ANSI OSC sequences: `\x1b]` ... (until BEL 0x07 or ST `\x1b\\`)
/// - Bare ESC (0x1b) not followed by `[` or `]`
///
/// Preserves: tab (0x09), newline (0x0A), carriage return (0x0D).
///
/// Returns `Cow::Borrowed` when the input contains no control characters (common case).
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let len = bytes.len();

    let needs_strip = bytes.iter().any(|&b| is_stripped_byte(b));
    if !needs_strip {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(len);
    let mut i = 0;

    while i < len {
        let b = bytes[i];

        if b == 0x1b {
            if i + 1 < len && bytes[i + 1] == b'[' {
                // CSI: skip parameter/intermediate bytes up to and including the final byte
                i += 2;
                while i < len {
                    let c = bytes[i];
                    i += 1;
                    if (0x40..=0x7e).contains(&c) {
                        break;
                    }
                }
            } else if i + 1 < len && bytes[i + 1] == b']' {
                // OSC: skip until BEL or ST
                i += 2;
                while i < len {
                    if bytes[i] == 0x07 {
                        i += 1;
                        break;
                    }
                    if bytes[i] == 0x1b && i + 1 < len && bytes[i + 1] == b'\\' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            } else {
                i += 1;
            }
        } else if is_stripped_byte(b) {
            i += 1;
        } else {
            let start = i;
            i += 1;
            while i < len && !is_stripped_byte(bytes[i]) {
                i += 1;
            }
            // SAFETY: we only break on ASCII control bytes, which cannot appear
            // mid-codepoint in valid UTF-8, so s[start..i] is valid UTF-8.
            out.push_str(&s[start..i]);
        }
    }

    Cow::Owned(out)
}

fn is_stripped_byte(b: u8) -> bool {
    b == 0x1b || b == 0x7f || (b < 0x20 && b != 0x09 && b != 0x0a && b != 0x0d)
}
