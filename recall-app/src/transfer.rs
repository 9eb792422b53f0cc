//! Export/import file formats.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use recall_core::{Card, CardId, Difficulty, EASE_DEFAULT};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const BUNDLE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportBundle {
    version: u32,
    exported_at: DateTime<Utc>,
    flashcards: Vec<Card>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportFile {
    Bundle(ExportBundle),
    Bare(Vec<Card>),
}

pub fn to_json(cards: &[Card], now: DateTime<Utc>) -> Result<String> {
    let bundle = ExportBundle {
        version: BUNDLE_VERSION,
        exported_at: now,
        flashcards: cards.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&bundle)?)
}

/// Accepts an export bundle or a bare card array.
pub fn from_json(text: &str) -> Result<Vec<Card>> {
    let file: ImportFile = serde_json::from_str(text).context("not a card export or card array")?;
    Ok(match file {
        ImportFile::Bundle(b) => b.flashcards,
        ImportFile::Bare(cards) => cards,
    })
}

/// One CSV row. Only `question` and `answer` are required; rows without
/// schedule columns import as new cards. `difficulty` is written for
/// readers of the file but re-derived on import.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    #[serde(default)]
    id: Option<CardId>,
    question: String,
    answer: String,
    #[serde(default)]
    ease_factor: Option<f64>,
    #[serde(default)]
    interval: Option<u32>,
    #[serde(default)]
    repetitions: Option<u32>,
    #[serde(default)]
    next_review: Option<i64>,
    #[serde(default)]
    mistakes: Option<u32>,
    #[serde(skip_deserializing)]
    difficulty: Option<Difficulty>,
}

pub fn write_csv<W: Write>(cards: &[Card], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for c in cards {
        wtr.serialize(CsvRow {
            id: Some(c.id),
            question: c.question.clone(),
            answer: c.answer.clone(),
            ease_factor: Some(c.ease_factor),
            interval: Some(c.interval),
            repetitions: Some(c.repetitions),
            next_review: Some(c.next_review.timestamp_millis()),
            mistakes: Some(c.mistakes),
            difficulty: Some(c.difficulty),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_csv<R: Read>(input: R, now: DateTime<Utc>) -> Result<Vec<Card>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(input);
    let mut cards = Vec::new();
    for (line, rec) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = rec.with_context(|| format!("csv record {}", line + 1))?;
        let mut card = Card::new(row.question, row.answer, now);
        if let Some(id) = row.id {
            card.id = id;
        }
        card.ease_factor = row.ease_factor.unwrap_or(EASE_DEFAULT);
        card.interval = row.interval.unwrap_or(0);
        card.repetitions = row.repetitions.unwrap_or(0);
        card.mistakes = row.mistakes.unwrap_or(0);
        if let Some(ms) = row.next_review {
            card.next_review = Utc
                .timestamp_millis_opt(ms)
                .single()
                .with_context(|| format!("csv record {}: bad nextReview", line + 1))?;
        }
        cards.push(card);
    }
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::{apply_quality, Quality};

    #[test]
    fn json_bundle_and_bare_array_both_import() {
        let now = Utc::now();
        let cards = vec![apply_quality(Card::new("q", "a", now), Quality::GOOD, now)];
        let bundle = to_json(&cards, now).unwrap();
        assert!(bundle.contains("\"flashcards\""));
        assert_eq!(from_json(&bundle).unwrap()[0].id, cards[0].id);

        let bare = serde_json::to_string(&cards).unwrap();
        assert_eq!(from_json(&bare).unwrap()[0].interval, 1);
        assert!(from_json("{\"cards\": 3}").is_err());
    }

    #[test]
    fn csv_export_keeps_schedule() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let mut card = Card::new("Capital, of France?", "Paris", now);
        for _ in 0..2 {
            card = apply_quality(card, Quality::EASY, now);
        }
        let mut buf = Vec::new();
        write_csv(&[card.clone()], &mut buf).unwrap();

        let back = read_csv(buf.as_slice(), Utc::now()).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].id, card.id);
        assert_eq!(back[0].question, "Capital, of France?");
        assert_eq!(back[0].interval, 6);
        assert_eq!(back[0].repetitions, 2);
        assert_eq!(back[0].next_review, card.next_review);
    }

    #[test]
    fn csv_with_only_text_columns_makes_new_cards() {
        let now = Utc::now();
        let input = "question,answer\n2+2?,4\nColor of sky?,Blue\n";
        let cards = read_csv(input.as_bytes(), now).unwrap();
        assert_eq!(cards.len(), 2);
        assert_ne!(cards[0].id, cards[1].id);
        assert_eq!(cards[1].answer, "Blue");
        assert_eq!(cards[0].ease_factor, EASE_DEFAULT);
        assert_eq!(cards[0].next_review, now);
    }

    #[test]
    fn csv_missing_answer_column_is_an_error() {
        assert!(read_csv("question\nonly\n".as_bytes(), Utc::now()).is_err());
    }
}
