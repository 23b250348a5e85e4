// Chat content formatting: raw server text -> styled fragments.
//
// Stages run in a fixed order: sanitize, `**bold**`, `_italic_`, then
// keyword decoration. Decoration only touches plain fragments so emphasis
// markers never interact with the inserted emoji.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Plain,
    Bold,
    Italic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub emphasis: Emphasis,
}

impl Fragment {
    fn new(text: impl Into<String>, emphasis: Emphasis) -> Self {
        Fragment {
            text: text.into(),
            emphasis,
        }
    }
}

/// Run the full pipeline over one message body.
pub fn format_content(raw: &str) -> Vec<Fragment> {
    let clean = sanitize(raw);

    let mut fragments = Vec::new();
    for (text, bold) in split_delimited(&clean, "**") {
        if bold {
            fragments.push(Fragment::new(text, Emphasis::Bold));
            continue;
        }
        for (text, italic) in split_delimited(text, "_") {
            if italic {
                fragments.push(Fragment::new(text, Emphasis::Italic));
            } else {
                fragments.push(Fragment::new(decorate_keywords(text), Emphasis::Plain));
            }
        }
    }
    fragments.retain(|f| !f.text.is_empty());
    fragments
}

/// Strip terminal control characters. Line breaks and tabs become spaces so
/// a message always renders as one logical line.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Split `text` on non-greedy `delim ... delim` pairs. Each piece is tagged
/// with whether it sat between a pair. An unmatched opener stays literal.
fn split_delimited<'a>(text: &'a str, delim: &str) -> Vec<(&'a str, bool)> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find(delim) {
        let after_open = &rest[open + delim.len()..];
        let Some(close) = after_open.find(delim) else {
            break;
        };
        pieces.push((&rest[..open], false));
        pieces.push((&after_open[..close], true));
        rest = &after_open[close + delim.len()..];
    }
    pieces.push((rest, false));
    pieces
}

fn keyword_emoji(word: &str) -> Option<&'static str> {
    match word.to_lowercase().as_str() {
        "mafia" => Some("🔴"),
        "detective" => Some("🔍"),
        "doctor" => Some("🏥"),
        "vote" => Some("🗳️"),
        "eliminate" => Some("💀"),
        _ => None,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn push_word(out: &mut String, word: &str) {
    if let Some(emoji) = keyword_emoji(word) {
        out.push_str(emoji);
        out.push(' ');
    }
    out.push_str(word);
}

/// Prefix whole-word game terms with their emoji, keeping the word's case.
fn decorate_keywords(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = None;
    for (i, c) in text.char_indices() {
        if is_word_char(c) {
            word_start.get_or_insert(i);
        } else {
            if let Some(start) = word_start.take() {
                push_word(&mut out, &text[start..i]);
            }
            out.push(c);
        }
    }
    if let Some(start) = word_start {
        push_word(&mut out, &text[start..]);
    }
    out
}
