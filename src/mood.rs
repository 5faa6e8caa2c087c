use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of moods a user can log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mood {
    Happy,
    Sad,
    Stressed,
    Relaxed,
}

#[derive(Debug, Error)]
#[error("Unknown mood '{0}', expected one of: Happy, Sad, Stressed, Relaxed (or 1-4)")]
pub struct UnknownMood(pub String);

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Happy, Mood::Sad, Mood::Stressed, Mood::Relaxed];

    /// Label persisted in the `moods` table.
    pub fn label(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Sad => "Sad",
            Mood::Stressed => "Stressed",
            Mood::Relaxed => "Relaxed",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Sad => "😔",
            Mood::Stressed => "😟",
            Mood::Relaxed => "😌",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.emoji(), self.label())
    }
}

impl FromStr for Mood {
    type Err = UnknownMood;

    /// Accepts `Happy`, `happy`, `😊 Happy`, `😊` or the menu index `1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        if let Ok(index) = input.parse::<usize>()
            && (1..=Mood::ALL.len()).contains(&index)
        {
            return Ok(Mood::ALL[index - 1]);
        }

        Mood::ALL
            .into_iter()
            .find(|mood| {
                let rest = input.strip_prefix(mood.emoji()).unwrap_or(input).trim();
                (rest.is_empty() && input.starts_with(mood.emoji()))
                    || rest.eq_ignore_ascii_case(mood.label())
            })
            .ok_or_else(|| UnknownMood(input.to_string()))
    }
}
