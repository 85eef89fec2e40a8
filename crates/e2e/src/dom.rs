//! Visible text extraction from server-rendered HTML
//!
//! A small tag walker, not a full HTML parser. It keeps an element stack so
//! that hidden subtrees can be skipped, treats `script`/`style` bodies as raw
//! text, and inserts word breaks at block boundaries.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<!\[CDATA\[.*?\]\]>|<![^>]*>|<\?[^>]*>|<(/?)([A-Za-z][A-Za-z0-9:-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#,
    )
    .expect("token regex")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute regex")
});

static INVISIBLE_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)display\s*:\s*none|visibility\s*:\s*hidden").expect("decl regex")
});

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[A-Za-z]+);").expect("entity regex"));

/// Elements whose content never renders in the viewport
const INVISIBLE_ELEMENTS: &[&str] = &["head", "script", "style", "template", "title"];

/// Elements whose body is raw text, not markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

struct Open {
    name: String,
    hidden: bool,
}

/// Text a user would see on the page, whitespace-collapsed
pub fn visible_text(html: &str) -> String {
    let mut text = String::new();
    let mut stack: Vec<Open> = Vec::new();
    let mut hidden_depth = 0usize;
    let mut pos = 0;

    while let Some(caps) = TOKEN.captures_at(html, pos) {
        let Some(whole) = caps.get(0) else { break };
        if hidden_depth == 0 {
            text.push_str(&decode_entities(&html[pos..whole.start()]));
        }
        pos = whole.end();

        let Some(name) = caps.get(2) else {
            // Comment, doctype or processing instruction
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        let closing = !caps[1].is_empty();
        let attrs = caps.get(3).map(|m| m.as_str()).unwrap_or("");

        if BLOCK_ELEMENTS.contains(&name.as_str()) {
            text.push(' ');
        }

        if closing {
            if let Some(idx) = stack.iter().rposition(|o| o.name == name) {
                for open in stack.drain(idx..) {
                    if open.hidden {
                        hidden_depth -= 1;
                    }
                }
            }
            continue;
        }

        if VOID_ELEMENTS.contains(&name.as_str()) || attrs.trim_end().ends_with('/') {
            continue;
        }

        let hidden = INVISIBLE_ELEMENTS.contains(&name.as_str()) || is_hidden(attrs);

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let end = find_closing(html, pos, &name);
            if hidden_depth == 0 && !hidden {
                text.push_str(&decode_entities(&html[pos..end.0]));
            }
            pos = end.1;
            continue;
        }

        if hidden {
            hidden_depth += 1;
        }
        stack.push(Open { name, hidden });
    }

    if hidden_depth == 0 {
        text.push_str(&decode_entities(&html[pos..]));
    }
    normalize_whitespace(&text)
}

/// Whether `expected` appears in the visible text of `html`
pub fn contains_visible_text(html: &str, expected: &str) -> bool {
    text_matches(&visible_text(html), expected)
}

/// Case-insensitive substring match with whitespace collapsed on both
/// sides, the rule Playwright's `getByText` applies to a string.
pub fn text_matches(visible: &str, expected: &str) -> bool {
    let expected = normalize_whitespace(expected).to_lowercase();
    if expected.is_empty() {
        return true;
    }
    normalize_whitespace(visible).to_lowercase().contains(&expected)
}

pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_hidden(attrs: &str) -> bool {
    ATTRIBUTE.captures_iter(attrs).any(|caps| {
        let name = &caps[1];
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or("");

        if name.eq_ignore_ascii_case("hidden") {
            true
        } else if name.eq_ignore_ascii_case("aria-hidden") {
            value.trim().eq_ignore_ascii_case("true")
        } else if name.eq_ignore_ascii_case("style") {
            INVISIBLE_DECL.is_match(value)
        } else {
            false
        }
    })
}

/// Start and end offsets of the closing tag of a raw text element, or the
/// end of input when it is unterminated.
fn find_closing(html: &str, from: usize, name: &str) -> (usize, usize) {
    let needle = format!("</{}", name);
    let lower = html[from..].to_ascii_lowercase();
    match lower.find(&needle) {
        Some(rel) => {
            let start = from + rel;
            let end = html[start..].find('>').map(|i| start + i + 1).unwrap_or(html.len());
            (start, end)
        }
        None => (html.len(), html.len()),
    }
}

fn decode_entities(s: &str) -> String {
    ENTITY
        .replace_all(s, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
