use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::models::MIN_TEXT_CHARS;

/// Rule family a moderation match belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    SelfHarm,
    Abusive,
    Discriminatory,
    Spam,
}

/// Why a piece of text was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    TooShort,
    Matched(Category),
    ExcessiveCapitals,
}

impl RejectionReason {
    /// Stable machine-readable slug
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::TooShort => "too_short",
            RejectionReason::Matched(Category::SelfHarm) => "self_harm_resource",
            RejectionReason::Matched(Category::Abusive) => "inappropriate_language",
            RejectionReason::Matched(Category::Discriminatory) => "discriminatory_language",
            RejectionReason::Matched(Category::Spam) => "spam",
            RejectionReason::ExcessiveCapitals => "excessive_capitals",
        }
    }

    /// Message shown to the submitter
    pub fn message(&self) -> &'static str {
        match self {
            RejectionReason::TooShort => "Message too short (minimum 3 characters).",
            RejectionReason::Matched(Category::SelfHarm) => {
                "Content related to self-harm detected. Please reach out: 988"
            }
            RejectionReason::Matched(Category::Abusive) => {
                "Inappropriate or abusive language detected."
            }
            RejectionReason::Matched(Category::Discriminatory) => {
                "Discriminatory language is not allowed."
            }
            RejectionReason::Matched(Category::Spam) => "Spam or prohibited content detected.",
            RejectionReason::ExcessiveCapitals => "Please avoid excessive capital letters.",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of classifying a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectionReason),
}

#[cfg(test)]
impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(reason) => Some(*reason),
        }
    }
}

/// How a single rule inspects the text
enum Matcher {
    Pattern(Regex),
    /// A run of at least this many identical characters, compared
    /// case-insensitively. Newlines break a run.
    RepeatedRun(usize),
}

impl Matcher {
    fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Pattern(regex) => regex.is_match(text),
            Matcher::RepeatedRun(min_run) => has_repeated_run(text, *min_run),
        }
    }
}

struct Rule {
    category: Category,
    matcher: Matcher,
}

fn pattern(category: Category, source: &str) -> Rule {
    // Sources are compile-time literals covered by the test suite.
    let regex = Regex::new(source).unwrap_or_else(|e| panic!("invalid moderation pattern: {e}"));
    Rule {
        category,
        matcher: Matcher::Pattern(regex),
    }
}

// Declared order is evaluation order; the first matching rule decides the category.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use Category::*;

    vec![
        // Self-harm
        pattern(
            SelfHarm,
            r"(?i)\b(kill|suicide|harm|hurt|cut|end)\s+(myself|yourself|themselves|my\s*self|your\s*self)\b",
        ),
        pattern(SelfHarm, r"(?i)\b(want|going|gonna)\s+to\s+(die|kill|end)\b"),
        pattern(SelfHarm, r"(?i)\b(suicidal|self[\s-]harm)\b"),
        // Abusive language
        pattern(
            Abusive,
            r"(?i)\b(f+u+c+k+|sh+i+t+|b+i+t+c+h+|a+s+s+h+o+l+e+|c+u+n+t+|d+a+m+n+|h+e+l+l+)\b|\b(f\*+c?k+|sh\*+t|b\*+tch)\b|\bf\*{2,}",
        ),
        pattern(
            Abusive,
            r"(?i)\b(stupid|idiot|dumb|moron|retard)\s+(you|people|everyone|person)\b",
        ),
        pattern(Abusive, r"(?i)\b(hate|despise|loathe)\s+(you|everyone|people|all)\b"),
        pattern(
            Abusive,
            r"(?i)\b(kill|murder|hurt|attack|beat)\s+(you|them|someone|people)\b",
        ),
        pattern(Abusive, r"(?i)\b(death|violence)\s+(threat|wish)\b"),
        pattern(Abusive, r"(?i)\b(shoot|stab|punch|hit)\s+(you|them|someone)\b"),
        // Discriminatory language
        pattern(Discriminatory, r"(?i)\b(racist|sexist|homophobic|transphobic)\b"),
        pattern(
            Discriminatory,
            r"(?i)\b(n+i+g+g+(a|as|az|er|ers)?|f+a+g+g+(ot|ots)?|tr+a+n+n+(y+|ies?))\b",
        ),
        // Spam
        Rule {
            category: Spam,
            matcher: Matcher::RepeatedRun(11),
        },
        pattern(Spam, r"(?i)\b(buy|click|visit|check)\s+(now|here|this)\b"),
        pattern(Spam, r"(?i)(https?://|www\.)"),
        pattern(Spam, r"\b[\w.-]+@[\w.-]+\.\w+\b"),
    ]
});

/// Letters beyond which the capitals check applies
const CAPS_MIN_LETTERS: usize = 10;
const CAPS_MAX_RATIO: f64 = 0.7;

fn has_repeated_run(text: &str, min_run: usize) -> bool {
    let mut prev: Option<char> = None;
    let mut run = 0;

    for ch in text.chars() {
        if ch == '\n' || ch == '\r' {
            prev = None;
            run = 0;
            continue;
        }

        let folded = fold_case(ch);
        if prev == Some(folded) {
            run += 1;
        } else {
            prev = Some(folded);
            run = 1;
        }

        if run >= min_run {
            return true;
        }
    }

    false
}

fn fold_case(ch: char) -> char {
    ch.to_lowercase().next().unwrap_or(ch)
}

fn has_excessive_caps(text: &str) -> bool {
    let letters = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
    if letters <= CAPS_MIN_LETTERS {
        return false;
    }

    let upper = text.chars().filter(|c| c.is_ascii_uppercase()).count();
    upper as f64 / letters as f64 > CAPS_MAX_RATIO
}

/// Pattern-based content classifier
#[derive(Clone, Default)]
pub struct ModerationEngine;

impl ModerationEngine {
    pub fn new() -> Self {
        // Compile the rule set up front so the first request doesn't pay for it.
        Lazy::force(&RULES);
        Self
    }

    /// Classify raw submitted text. Pure and deterministic.
    pub fn classify(&self, text: &str) -> Verdict {
        if text.trim().chars().count() < MIN_TEXT_CHARS {
            return Verdict::Rejected(RejectionReason::TooShort);
        }

        if let Some(category) = self.first_matching_category(text) {
            return Verdict::Rejected(RejectionReason::Matched(category));
        }

        if has_excessive_caps(text) {
            return Verdict::Rejected(RejectionReason::ExcessiveCapitals);
        }

        Verdict::Accepted
    }

    fn first_matching_category(&self, text: &str) -> Option<Category> {
        RULES
            .iter()
            .find(|rule| rule.matcher.is_match(text))
            .map(|rule| rule.category)
    }
}
