use crate::{GenError, GenResult};
use once_cell::sync::Lazy;
use recall_core::RawCard;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

static ARRAY_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

/// Extracts card pairs from a model reply.
///
/// Models wrap the array in prose or code fences, so only the span from the
/// first `[` to the last `]` is parsed. Entries with a missing or blank side
/// are skipped.
pub fn parse_pairs(content: &str) -> GenResult<Vec<RawCard>> {
    let span = ARRAY_SPAN
        .find(content)
        .ok_or_else(|| GenError::Parse("no JSON array in reply".into()))?;
    let items: Vec<Value> =
        serde_json::from_str(span.as_str()).map_err(|e| GenError::Parse(e.to_string()))?;

    let total = items.len();
    let pairs: Vec<RawCard> = items
        .iter()
        .filter_map(|item| {
            let raw = RawCard::new(text_field(item, "question")?, text_field(item, "answer")?);
            raw.normalized()
        })
        .collect();

    if pairs.len() < total {
        warn!(skipped = total - pairs.len(), "dropped incomplete generated pairs");
    }
    if pairs.is_empty() {
        return Err(GenError::Parse("reply contained no usable pairs".into()));
    }
    Ok(pairs)
}

fn text_field(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
