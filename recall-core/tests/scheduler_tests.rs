use chrono::{Duration, Utc};
use recall_core::{apply_quality, next_ease, Card, Difficulty, Quality, EASE_MIN, MS_PER_DAY};

fn fresh() -> Card {
    Card::new("hola", "hello", Utc::now())
}

#[test]
fn ease_never_drops_below_floor() {
    let now = Utc::now();
    let sequences: [&[i32]; 5] = [
        &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        &[0, 0, 0, 0],
        &[5, 1, 3, 1, 5, 0, 2, 4],
        &[-7, 100, 3, -1, 5],
        &[3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3],
    ];
    for seq in sequences {
        let mut card = fresh();
        for &q in seq {
            card = apply_quality(card, Quality(q), now);
            assert!(card.ease_factor >= EASE_MIN, "ease {} after {:?}", card.ease_factor, seq);
        }
    }
}

#[test]
fn lapse_zeroes_streak_and_counts_one_mistake() {
    let now = Utc::now();
    for q in [0, 1, 2, -3] {
        let mut card = fresh();
        for _ in 0..4 {
            card = apply_quality(card, Quality::EASY, now);
        }
        card.mistakes = 2;

        let lapsed = apply_quality(card, Quality(q), now);
        assert_eq!(lapsed.repetitions, 0);
        assert_eq!(lapsed.interval, 0);
        assert_eq!(lapsed.mistakes, 3);
        assert_eq!(lapsed.next_review, now);
    }
}

#[test]
fn repeated_lapses_stay_at_zero() {
    let now = Utc::now();
    let mut card = fresh();
    for i in 1..=6 {
        card = apply_quality(card, Quality::HARD, now);
        assert_eq!((card.interval, card.repetitions, card.mistakes), (0, 0, i));
    }
}

#[test]
fn success_intervals_go_one_six_then_ease() {
    let now = Utc::now();
    let first = apply_quality(fresh(), Quality::GOOD, now);
    assert_eq!(first.interval, 1);
    assert_eq!(first.repetitions, 1);

    let second = apply_quality(first, Quality::GOOD, now);
    assert_eq!(second.interval, 6);
    assert_eq!(second.repetitions, 2);

    let ease_after_second = second.ease_factor;
    let third = apply_quality(second, Quality::GOOD, now);
    assert_eq!(third.interval, (6.0 * ease_after_second).round() as u32);
    assert_eq!(third.repetitions, 3);
}

#[test]
fn success_after_lapse_restarts_at_one_day() {
    let now = Utc::now();
    let mut card = fresh();
    for _ in 0..3 {
        card = apply_quality(card, Quality::EASY, now);
    }
    card = apply_quality(card, Quality::HARD, now);
    card = apply_quality(card, Quality::GOOD, now);
    assert_eq!(card.interval, 1);
    assert_eq!(card.repetitions, 1);
}

#[test]
fn three_easy_ratings_from_new() {
    let now = Utc::now();
    let e2 = next_ease(next_ease(2.5, Quality::EASY), Quality::EASY);

    let mut card = fresh();
    for _ in 0..3 {
        card = apply_quality(card, Quality::EASY, now);
    }
    assert_eq!(card.repetitions, 3);
    assert_eq!(card.interval, (6.0 * e2).round() as u32);
    assert_eq!(card.interval, 16);
    assert_eq!(card.next_review, now + Duration::days(16));
}

#[test]
fn single_hard_rating_from_new() {
    let card = apply_quality(fresh(), Quality::HARD, Utc::now());
    assert_eq!(card.repetitions, 0);
    assert_eq!(card.interval, 0);
    assert_eq!(card.mistakes, 1);
    assert_eq!(card.difficulty, Difficulty::Medium);
}

#[test]
fn many_mistakes_make_card_hard_regardless_of_streak() {
    let now = Utc::now();
    for q in [Quality::HARD, Quality::GOOD, Quality::EASY] {
        let mut card = fresh();
        card.mistakes = 4;
        card.repetitions = 9;
        card.interval = 30;
        let rated = apply_quality(card, q, now);
        assert_eq!(rated.difficulty, Difficulty::Hard);
    }
}

#[test]
fn long_clean_streak_becomes_easy() {
    let now = Utc::now();
    let mut card = fresh();
    for _ in 0..5 {
        card = apply_quality(card, Quality::GOOD, now);
        assert_eq!(card.difficulty, Difficulty::Medium);
    }
    card = apply_quality(card, Quality::GOOD, now);
    assert_eq!(card.repetitions, 6);
    assert_eq!(card.difficulty, Difficulty::Easy);
}

#[test]
fn difficulty_tracks_counters_after_every_update() {
    let now = Utc::now();
    let mut card = fresh();
    for q in [5, 1, 3, 3, 1, 5, 5, 5, 5, 5, 5, 1, 1] {
        card = apply_quality(card, Quality(q), now);
        assert_eq!(card.difficulty, Difficulty::derive(card.repetitions, card.mistakes));
    }
}

#[test]
fn next_review_is_interval_days_from_now() {
    let now = Utc::now();
    let mut card = fresh();
    for _ in 0..4 {
        card = apply_quality(card, Quality::GOOD, now);
        let expected_ms = card.interval as i64 * MS_PER_DAY;
        assert_eq!((card.next_review - now).num_milliseconds(), expected_ms);
    }
}

#[test]
fn update_leaves_identity_and_content_alone() {
    let card = fresh();
    let rated = apply_quality(card.clone(), Quality(4), Utc::now());
    assert_eq!(rated.id, card.id);
    assert_eq!(rated.question, card.question);
    assert_eq!(rated.answer, card.answer);
}
