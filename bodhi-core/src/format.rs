//! Markdown-subset to HTML formatting for assistant replies
//!
//! Only two constructs are recognized: `**bold**` spans and list items
//! starting with `- ` or `• `. Everything else passes through as literal
//! text, so headers, links, code spans and ordered lists stay untouched.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"));

const LIST_PREFIXES: [&str; 2] = ["- ", "• "];
const LIST_OPEN: &str = "<ul>";
const LIST_CLOSE: &str = "</ul>";

/// Convert a model reply into HTML fragments for the chat widget.
///
/// Lines are trimmed and blank lines are dropped. A blank line inside a list
/// closes it; the next bullet opens a fresh `<ul>`.
pub fn format_response(text: &str) -> String {
    let text = BOLD_RE.replace_all(text, "<strong>${1}</strong>");

    let mut out: Vec<String> = Vec::new();
    let mut in_list = false;

    for line in text.split('\n') {
        let line = line.trim();

        if let Some(item) = list_item(line) {
            if !in_list {
                out.push(LIST_OPEN.to_string());
                in_list = true;
            }
            out.push(format!("<li>{}</li>", item));
            continue;
        }

        if in_list {
            out.push(LIST_CLOSE.to_string());
            in_list = false;
        }
        if !line.is_empty() {
            out.push(line.to_string());
        }
    }

    if in_list {
        out.push(LIST_CLOSE.to_string());
    }

    out.join("\n")
}

fn list_item(line: &str) -> Option<&str> {
    LIST_PREFIXES
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))
}
