#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Command {
    Mood(String),
    Moods,
    Speak,
    History,
    Resources,
    Status,
    ClearSpeech,
    Help,
    Quit,
    Unknown(String),
    /// Anything that is not a command, blank lines included.
    Chat(String),
}

pub(super) fn parse(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Chat(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "mood" if arg.is_empty() => Command::Moods,
        "mood" => Command::Mood(arg.to_string()),
        "moods" => Command::Moods,
        "speak" => Command::Speak,
        "history" => Command::History,
        "resources" => Command::Resources,
        "status" => Command::Status,
        "clear" => Command::ClearSpeech,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_chat() {
        assert_eq!(
            parse("I feel a bit low today\n"),
            Command::Chat("I feel a bit low today".into())
        );
        assert_eq!(parse("   "), Command::Chat("   ".into()));
    }

    #[test]
    fn mood_takes_an_argument() {
        assert_eq!(parse("/mood 😊 Happy"), Command::Mood("😊 Happy".into()));
        assert_eq!(parse("/MOOD   2 "), Command::Mood("2".into()));
        assert_eq!(parse("/mood"), Command::Moods);
    }

    #[test]
    fn known_and_unknown_commands() {
        assert_eq!(parse("/speak"), Command::Speak);
        assert_eq!(parse("/history"), Command::History);
        assert_eq!(parse("/clear"), Command::ClearSpeech);
        assert_eq!(parse("/exit"), Command::Quit);
        assert_eq!(parse("/dance"), Command::Unknown("dance".into()));
    }
}
