// src/render.rs - Turns raw model/user text into a safe HTML fragment.
//
// The order of the passes is load-bearing: escaping runs first so injected
// markup can never become live HTML, linkification runs before the markdown
// pass so asterisks inside a URL are not mangled by emphasis tags, and line
// breaks are converted last.
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    // Scheme-optional URL: dotted host with a 2-6 letter TLD, optional path.
    static ref URL_RE: Regex = Regex::new(
        r"(?i)\b(?:https?://)?(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,6}(?:/[^\s<]*)?"
    )
    .expect("url regex must compile");
    static ref BOLD_RE: Regex = Regex::new(r"\*\*([^*]+)\*\*").expect("bold regex must compile");
    static ref ITALIC_RE: Regex = Regex::new(r"\*([^*]+)\*").expect("italic regex must compile");
}

/// Render untrusted text as a chat-transcript HTML fragment.
pub fn render(raw: &str) -> String {
    let escaped = escape_html(raw);
    let linked = linkify(&escaped);
    let emphasized = apply_emphasis(&linked);
    emphasized.replace("\r\n", "\n").replace('\n', "<br>")
}

/// Escape the five HTML-sensitive characters. Already-encoded entities are
/// left alone so re-escaping escaped text is a no-op.
pub fn escape_html(text: &str) -> String {
    const KNOWN_ENTITIES: [&str; 6] = ["amp;", "lt;", "gt;", "quot;", "#39;", "#x27;"];

    let mut out = String::with_capacity(text.len());
    let mut rest = text.char_indices();
    while let Some((index, ch)) = rest.next() {
        match ch {
            '&' => {
                let tail = &text[index + 1..];
                if KNOWN_ENTITIES.iter().any(|entity| tail.starts_with(entity)) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Wrap URL-like substrings in anchors that open in a new context without a
/// back-reference to the opener. A missing scheme gets `http://` prepended.
fn linkify(text: &str) -> String {
    URL_RE
        .replace_all(text, |caps: &Captures| {
            let visible = &caps[0];
            let lowered = visible.to_ascii_lowercase();
            let href = if lowered.starts_with("http://") || lowered.starts_with("https://") {
                visible.to_string()
            } else {
                format!("http://{}", visible)
            };
            format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                href, visible
            )
        })
        .into_owned()
}

/// Exactly two inline transforms, bold before italic. Nested or overlapping
/// markers are not specially handled.
fn apply_emphasis(text: &str) -> String {
    let bolded = BOLD_RE.replace_all(text, "<strong>$1</strong>");
    ITALIC_RE.replace_all(&bolded, "<em>$1</em>").into_owned()
}
