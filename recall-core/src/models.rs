use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type CardId = Uuid;

pub const EASE_MIN: f64 = 1.3;
pub const EASE_DEFAULT: f64 = 2.5;
pub const MS_PER_DAY: i64 = 86_400_000;

/// Lowest `repetitions` count at which a card counts as mastered.
pub const MASTERED_REPETITIONS: u32 = 5;

/// Review rating on the SM-2 0..=5 scale.
///
/// The presentation layer only ever produces 1, 3 and 5, but any integer is
/// accepted and flows through the same formula.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Quality(pub i32);

impl Quality {
    pub const HARD: Quality = Quality(1);
    pub const GOOD: Quality = Quality(3);
    pub const EASY: Quality = Quality(5);

    /// The three ratings offered to the user, in button order.
    pub const BUTTONS: [Quality; 3] = [Quality::HARD, Quality::GOOD, Quality::EASY];

    pub fn value(self) -> i32 {
        self.0
    }

    pub fn is_lapse(self) -> bool {
        self.0 < 3
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            i32::MIN..=2 => "hard",
            3 | 4 => "good",
            _ => "easy",
        }
    }

    /// Parses user input: named ratings (`h`, `good`, ...) or any integer.
    pub fn parse(s: &str) -> Option<Quality> {
        match s.trim().to_lowercase().as_str() {
            "h" | "hard" => Some(Quality::HARD),
            "g" | "good" => Some(Quality::GOOD),
            "e" | "easy" => Some(Quality::EASY),
            other => other.parse::<i32>().ok().map(Quality),
        }
    }
}

impl From<i32> for Quality {
    fn from(v: i32) -> Self {
        Quality(v)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Hard,
    Medium,
    Easy,
}

impl Difficulty {
    /// Queue priority: hard cards are studied first.
    pub fn rank(self) -> u8 {
        match self {
            Difficulty::Hard => 0,
            Difficulty::Medium => 1,
            Difficulty::Easy => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Hard => "hard",
            Difficulty::Medium => "medium",
            Difficulty::Easy => "easy",
        }
    }

    /// Difficulty as a function of the review history counters.
    ///
    /// An untouched card (no successes, no mistakes) is `Easy`. Every review
    /// moves one of the two counters, so after the first rating the ordinary
    /// rule applies: more than three mistakes is `Hard`, more than five
    /// straight successes with fewer than two mistakes is `Easy`, anything
    /// else is `Medium`.
    pub fn derive(repetitions: u32, mistakes: u32) -> Difficulty {
        if mistakes > 3 {
            Difficulty::Hard
        } else if repetitions > 5 && mistakes < 2 {
            Difficulty::Easy
        } else if repetitions == 0 && mistakes == 0 {
            Difficulty::Easy
        } else {
            Difficulty::Medium
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hard" => Ok(Difficulty::Hard),
            "medium" => Ok(Difficulty::Medium),
            "easy" => Ok(Difficulty::Easy),
            _ => Err(crate::CoreError::Invalid("difficulty")),
        }
    }
}

/// Question/answer pair before it becomes a scheduled card.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawCard {
    pub question: String,
    pub answer: String,
}

impl RawCard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Trimmed copy, or `None` when either side is blank.
    pub fn normalized(&self) -> Option<RawCard> {
        let question = self.question.trim();
        let answer = self.answer.trim();
        if question.is_empty() || answer.is_empty() {
            None
        } else {
            Some(RawCard::new(question, answer))
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(default = "Uuid::new_v4")]
    pub id: CardId,
    pub question: String,
    pub answer: String,

    pub ease_factor: f64,
    pub interval: u32,
    pub repetitions: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub next_review: DateTime<Utc>,
    pub mistakes: u32,
    pub difficulty: Difficulty,
}

impl Card {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            answer: answer.into(),
            ease_factor: EASE_DEFAULT,
            interval: 0,
            repetitions: 0,
            next_review: now,
            mistakes: 0,
            difficulty: Difficulty::Easy,
        }
    }

    pub fn from_raw(raw: RawCard, now: DateTime<Utc>) -> Self {
        Self::new(raw.question, raw.answer, now)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }

    pub fn is_mastered(&self) -> bool {
        self.repetitions >= MASTERED_REPETITIONS && self.mistakes < 2
    }

    /// Restores the create-time schedule, keeping id and content.
    pub fn reset_schedule(&mut self, now: DateTime<Utc>) {
        self.ease_factor = EASE_DEFAULT;
        self.interval = 0;
        self.repetitions = 0;
        self.next_review = now;
        self.mistakes = 0;
        self.refresh_difficulty();
    }

    pub fn refresh_difficulty(&mut self) {
        self.difficulty = Difficulty::derive(self.repetitions, self.mistakes);
    }

    /// Brings an externally supplied ease factor back into range: non-finite
    /// values become the default, anything else is floored at the minimum.
    pub fn clamp_ease(&mut self) {
        self.ease_factor = if self.ease_factor.is_finite() {
            self.ease_factor.max(EASE_MIN)
        } else {
            EASE_DEFAULT
        };
    }
}
