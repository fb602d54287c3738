use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_SPAN: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref DASH_RUN: Regex = Regex::new(r"-{2,}").unwrap();
    static ref BRACE_SPAN: Regex = Regex::new(r"\{[^{}]*\}").unwrap();
    static ref BRACKET_SPAN: Regex = Regex::new(r"\[[^\[\]]*\]").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Schema field names and fixed enum values the model sometimes echoes
/// back instead of keeping them inside the JSON envelope. Deleted as
/// literal substrings. Short generic words (`text`, `name`) stay out of
/// this list: deleting them would mangle prose.
const BOILERPLATE_TOKENS: &[&str] = &[
    "html_response",
    "facialExpression",
    "function_call",
    "animation",
    "Talking_0",
    "Talking_1",
    "Talking_2",
];

/// Characters that already close a sentence; scrubbed text ending in one
/// of these does not get a period appended.
const TERMINAL_CHARS: &[char] = &[
    '.', '!', '?', '…', '😘', '😊', '😉', '🥰', '😂', '🎉', '❤', '\u{fe0f}',
];

fn decode_entities(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = current
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&");
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_markup_once(text: &str) -> String {
    let decoded = decode_entities(text);
    let untagged = TAG_SPAN.replace_all(&decoded, "");
    // Stray angle brackets left behind (unterminated tags, decoded
    // entities) go too, so output never contains '<' or '>'.
    let unangled: String = untagged.chars().filter(|c| *c != '<' && *c != '>').collect();
    WHITESPACE_RUN.replace_all(&unangled, " ").trim().to_string()
}

/// Removes tag-like spans, decodes the small fixed entity set, and
/// normalizes whitespace. Runs to fixpoint so that removals cannot
/// recombine into fresh markup; a second application is always a no-op.
/// Identity (modulo whitespace collapsing) on text that is already
/// markup-free. Never fails.
pub fn strip_markup(text: &str) -> String {
    let mut current = strip_markup_once(text);
    loop {
        let next = strip_markup_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn remove_boilerplate_tokens(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let mut next = current.clone();
        for token in BOILERPLATE_TOKENS {
            next = next.replace(token, "");
        }
        if next == current {
            return current;
        }
        current = next;
    }
}

fn remove_structured_spans(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = BRACKET_SPAN
            .replace_all(&BRACE_SPAN.replace_all(&current, ""), "")
            .to_string();
        if next == current {
            break;
        }
        current = next;
    }
    // Unmatched delimiters survive the span passes; drop them outright.
    current
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '[' | ']'))
        .collect()
}

fn scrub_once(text: &str) -> String {
    let dashless = DASH_RUN.replace_all(text, "").to_string();
    let detokened = remove_boilerplate_tokens(&dashless);

    // An opening brace mid-text means the reply ended and the model
    // started echoing its output schema; cut there.
    let truncated = match detokened.find('{') {
        Some(pos) if pos > 0 => &detokened[..pos],
        _ => detokened.as_str(),
    };

    let unstructured = remove_structured_spans(truncated);
    let unquoted: String = unstructured
        .chars()
        .filter(|c| !matches!(c, '"' | '\u{201c}' | '\u{201d}'))
        .collect();
    let collapsed = WHITESPACE_RUN.replace_all(&unquoted, " ").trim().to_string();

    let segments: Vec<&str> = collapsed
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(2)
        .collect();
    let mut result = segments.join(". ");

    if let Some(last) = result.chars().last() {
        if !TERMINAL_CHARS.contains(&last) {
            result.push('.');
        }
    }
    result
}

/// Best-effort removal of structured-data noise the model leaks into its
/// prose: dash rules, schema tokens, JSON fragments. Keeps at most the
/// first two sentences. Heuristic, not guaranteed: it cannot tell a
/// legitimate brace in prose from a leaked schema. Runs to fixpoint so a
/// second application is always a no-op. Worst case returns an empty
/// string; never fails.
pub fn scrub_structured_fragments(text: &str) -> String {
    let mut current = scrub_once(text);
    loop {
        let next = scrub_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
