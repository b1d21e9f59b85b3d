use wayfinder_planner::escape::html_to_text;

/// What a line is, so it can be restyled when the theme flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    UserHeader,
    UserText,
    BotHeader,
    BotText,
    Label,
    Value,
    Dim,
    System,
    Error,
}

#[derive(Clone)]
pub struct TranscriptLine {
    pub text: String,
    pub tone: Tone,
}

impl TranscriptLine {
    pub fn new(text: String, tone: Tone) -> Self {
        Self { text, tone }
    }
}

/// Plain-text lines of an HTML chat bubble, indented under its header.
pub fn bubble_lines(html: &str) -> Vec<String> {
    html_to_text(html)
        .lines()
        .map(|line| format!("  {line}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn itinerary_bubble_becomes_indented_lines() {
        let html = "<div style=\"margin-bottom: 12px;\"><strong>Step 1:</strong> Fort (&#8377;20)<br><em>Reason:</em> views</div><div><strong>Total Estimated Cost:</strong> &#8377;20<br><strong>Time of Day:</strong> Morning</div>";
        assert_eq!(
            bubble_lines(html),
            vec![
                "  Step 1: Fort (₹20)",
                "  Reason: views",
                "  Total Estimated Cost: ₹20",
                "  Time of Day: Morning",
            ]
        );
    }

    #[test]
    fn escaped_user_text_is_shown_verbatim() {
        assert_eq!(bubble_lines("cheap &amp; cheerful &lt;3"), vec!["  cheap & cheerful <3"]);
    }
}
