#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reevaluate, // /reeval | /re
    Theme,      // /theme
    Help,       // /help
    Quit,       // /quit or /exit
    Unknown(String),
}

pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return Command::Unknown(trimmed.to_string());
    }
    let verb = trimmed.split_whitespace().next().unwrap_or_default();

    match verb {
        "/reeval" | "/re" => Command::Reevaluate,
        "/theme" => Command::Theme,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_verbs() {
        assert_eq!(parse_command("/reeval"), Command::Reevaluate);
        assert_eq!(parse_command("  /re  "), Command::Reevaluate);
        assert_eq!(parse_command("/theme"), Command::Theme);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("/help me"), Command::Help);
    }

    #[test]
    fn anything_else_is_unknown() {
        assert_eq!(parse_command("/claim x"), Command::Unknown("/claim x".into()));
        assert_eq!(parse_command("reeval"), Command::Unknown("reeval".into()));
    }
}
