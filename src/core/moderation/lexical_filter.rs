// Lexical exemptions - decided from the raw message text alone.
//
// Rules run in order and the first match wins:
// 1. Too short to judge (<= 4 characters)
// 2. Commands and mentions (`/` or `@` prefix)
// 3. "XD" laughter (only x and d letters)
// 4. "haha" laughter (only h and a letters)
// 5. Contains a link

const MAX_EXEMPT_LENGTH: usize = 4;

/// Which lexical rule exempted a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalExemption {
    TooShort,
    CommandOrMention,
    XdLaughter,
    HahaLaughter,
    ContainsLink,
}

impl std::fmt::Display for LexicalExemption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexicalExemption::TooShort => write!(f, "Too Short"),
            LexicalExemption::CommandOrMention => write!(f, "Command Or Mention"),
            LexicalExemption::XdLaughter => write!(f, "XD Laughter"),
            LexicalExemption::HahaLaughter => write!(f, "Haha Laughter"),
            LexicalExemption::ContainsLink => write!(f, "Contains Link"),
        }
    }
}

/// Return the first lexical rule that exempts `text`, if any.
pub fn lexical_exemption(text: &str) -> Option<LexicalExemption> {
    if text.chars().count() <= MAX_EXEMPT_LENGTH {
        return Some(LexicalExemption::TooShort);
    }

    if text.starts_with('/') || text.starts_with('@') {
        return Some(LexicalExemption::CommandOrMention);
    }

    let lowered = text.to_lowercase();

    if consists_only_of(&lowered, &['x', 'd']) {
        return Some(LexicalExemption::XdLaughter);
    }

    if consists_only_of(&lowered, &['h', 'a']) {
        return Some(LexicalExemption::HahaLaughter);
    }

    if lowered.contains("https://") {
        return Some(LexicalExemption::ContainsLink);
    }

    None
}

pub fn is_lexically_exempt(text: &str) -> bool {
    match lexical_exemption(text) {
        Some(exemption) => {
            tracing::debug!(%exemption, "Message lexically exempt");
            true
        }
        None => false,
    }
}

// Equivalent to stripping every listed letter and checking for an empty string.
fn consists_only_of(text: &str, letters: &[char]) -> bool {
    text.chars().all(|c| letters.contains(&c))
}
