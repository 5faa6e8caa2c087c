/// Phrases that trigger the helpline notice when they appear anywhere in the
/// user's input.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "suicidal",
    "end my life",
    "kill myself",
    "want to die",
    "harm myself",
];

pub const HELPLINE_NOTICE: &str = "🚨 If you are in crisis, please call your local helpline immediately (e.g., 1800-599-0019 in India).";

pub const COUNSELOR_NOTICE: &str =
    "You can also text HOME to 741741 to connect with a crisis counselor in many countries.";

pub const SPOKEN_SAFETY_MESSAGE: &str = "It sounds like you are going through something really hard. \
     You don't have to face it alone. Please call your local crisis helpline right now, \
     or text HOME to 741741 to reach a crisis counselor.";

pub const RESOURCES: &[&str] = &[
    "National Suicide Prevention Lifeline: 1-800-273-8255 (US)",
    "Crisis Text Line: Text HOME to 741741 (US)",
    "International Association for Suicide Prevention: https://www.iasp.info/resources/Crisis_Centres/",
    "Mental Health America: https://www.mhanational.org/",
];

/// Case-insensitive literal substring check. No tokenizing or stemming, so
/// it both over- and under-triggers.
pub fn contains_crisis_signal<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    let text = text.to_lowercase();
    keywords.iter().any(|keyword| {
        let keyword = keyword.as_ref().trim().to_lowercase();
        !keyword.is_empty() && text.contains(&keyword)
    })
}
