//! HTML escaping for backend- and user-sourced text, plus the inverse
//! helpers the terminal front end needs to show HTML bubbles as text.
use html_escape::decode_html_entities;

/// Escape `&`, `<`, `>` and `"` for safe embedding in HTML.
///
/// ```
/// use wayfinder_planner::escape::escape_html;
///
/// assert_eq!(escape_html("<b>\"fish & chips\"</b>"),
///            "&lt;b&gt;&quot;fish &amp; chips&quot;&lt;/b&gt;");
/// ```
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Decode every HTML entity: named (`&eacute;`, `&hellip;`, ...), decimal
/// and hex. Text that is not an entity is left alone.
///
/// ```
/// use wayfinder_planner::escape::unescape_html;
///
/// assert_eq!(unescape_html("Caf&eacute; &amp; more&hellip;"), "Café & more…");
/// ```
pub fn unescape_html(s: &str) -> String {
    decode_html_entities(s).into_owned()
}

/// Light HTML-to-text for chat bubbles: tags are dropped, `<br>` and the
/// end of block elements become line breaks, whitespace outside `<pre>`
/// collapses, entities are decoded, and runs of blank lines collapse.
///
/// ```
/// use wayfinder_planner::escape::html_to_text;
///
/// let text = html_to_text("<div><strong>Step 1:</strong> Caf&eacute;<br><em>Reason:</em> a &amp; b</div>");
/// assert_eq!(text, "Step 1: Café\nReason: a & b");
/// ```
pub fn html_to_text(html: &str) -> String {
    let mut raw = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut in_pre = false;
    let mut tag = String::new();
    for ch in html.chars() {
        match ch {
            '<' if !in_tag => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let closing = tag.starts_with('/');
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if name == "pre" {
                    in_pre = !closing;
                }
                if name == "br" || (closing && matches!(name.as_str(), "div" | "p" | "pre" | "li"))
                {
                    while raw.ends_with(' ') {
                        raw.pop();
                    }
                    raw.push('\n');
                }
            }
            _ if in_tag => tag.push(ch),
            c if c.is_whitespace() && !in_pre => {
                if !(raw.is_empty() || raw.ends_with(' ') || raw.ends_with('\n')) {
                    raw.push(' ');
                }
            }
            _ => raw.push(ch),
        }
    }

    let decoded = unescape_html(&raw);
    let mut lines: Vec<&str> = Vec::new();
    for line in decoded.lines() {
        let line = line.trim_end();
        if line.is_empty() && lines.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_payload_is_fully_escaped_and_reversible() {
        let input = "<script>&\"</script>";
        let escaped = escape_html(input);
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
        assert!(!escaped.contains('"'));
        // every remaining ampersand starts an entity we emitted
        assert_eq!(
            escaped.matches('&').count(),
            escaped.matches("&lt;").count()
                + escaped.matches("&gt;").count()
                + escaped.matches("&amp;").count()
                + escaped.matches("&quot;").count()
        );
        assert_eq!(unescape_html(&escaped), input);
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(escape_html("Lalbagh Botanical Garden"), "Lalbagh Botanical Garden");
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn unescape_handles_numeric_and_stray_ampersands() {
        assert_eq!(unescape_html("&#39;hi&#x27; & bye"), "'hi' & bye");
        assert_eq!(unescape_html("AT&T"), "AT&T");
    }

    #[test]
    fn named_entities_beyond_the_escaped_four_are_decoded() {
        assert_eq!(unescape_html("Caf&eacute;"), "Café");
        assert_eq!(unescape_html("wait&hellip;"), "wait…");
        assert_eq!(unescape_html("&copy; OSM&nbsp;"), "© OSM\u{a0}");
        assert_eq!(
            html_to_text("<strong>Step 2:</strong> Cr&egrave;me Br&ucirc;l&eacute;e"),
            "Step 2: Crème Brûlée"
        );
    }

    #[test]
    fn html_to_text_keeps_line_structure() {
        let html = "<div style=\"margin-bottom: 12px;\">\n  <strong>Step 1:</strong> Fort (&#8377;20)<br>\n  <em>Reason:</em> views\n</div><div><strong>Total:</strong> $5</div>";
        assert_eq!(html_to_text(html), "Step 1: Fort (₹20)\nReason: views\nTotal: $5");
    }

    #[test]
    fn html_to_text_preserves_escaped_markup_as_text() {
        let html = format!("<pre>{}</pre>", escape_html("{\"a\": \"<b>\"}"));
        assert_eq!(html_to_text(&html), "{\"a\": \"<b>\"}");
    }
}
