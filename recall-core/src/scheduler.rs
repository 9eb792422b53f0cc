use crate::{Card, Quality, EASE_MIN, MS_PER_DAY};
use chrono::{DateTime, Duration, Utc};

/// SM-2 ease adjustment, floored at `EASE_MIN` and unbounded above.
pub fn next_ease(ease: f64, quality: Quality) -> f64 {
    // f64 keeps `5 - q` from overflowing for extreme i32 ratings.
    let miss = 5.0 - quality.value() as f64;
    let delta = 0.1 - miss * (0.08 + miss * 0.02);
    (ease + delta).max(EASE_MIN)
}

/// Interval in days that `quality` would give `card`, using its current ease.
pub fn next_interval(card: &Card, quality: Quality) -> u32 {
    if quality.is_lapse() {
        return 0;
    }
    match card.repetitions {
        0 => 1,
        1 => 6,
        _ => {
            let grown = (card.interval as f64 * card.ease_factor).round();
            if grown >= u32::MAX as f64 {
                u32::MAX
            } else {
                grown.max(0.0) as u32
            }
        }
    }
}

/// `now + interval` whole days, saturating at the latest representable instant.
pub fn due_after(now: DateTime<Utc>, interval: u32) -> DateTime<Utc> {
    let offset = Duration::milliseconds(interval as i64 * MS_PER_DAY);
    now.checked_add_signed(offset)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Applies one review to `card` and returns it.
///
/// A lapse (`quality < 3`) zeroes the streak and interval and counts a
/// mistake. A success grows the interval 1, 6, then `interval * ease`. The
/// ease factor, next review instant and difficulty are recomputed on both
/// paths; id and content are left alone.
pub fn apply_quality(mut card: Card, quality: Quality, now: DateTime<Utc>) -> Card {
    let interval = next_interval(&card, quality);

    if quality.is_lapse() {
        card.repetitions = 0;
        card.mistakes = card.mistakes.saturating_add(1);
    } else {
        card.repetitions = card.repetitions.saturating_add(1);
    }
    card.interval = interval;
    card.ease_factor = next_ease(card.ease_factor, quality);
    card.next_review = due_after(now, interval);
    card.refresh_difficulty();

    card
}

/// Interval each rating button would produce, without touching the card.
pub fn preview(card: &Card) -> [(Quality, u32); 3] {
    Quality::BUTTONS.map(|q| (q, next_interval(card, q)))
}
