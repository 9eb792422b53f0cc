use recall_core::{CardId, Quality, RawCard};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct PairIn {
    pub question: String,
    pub answer: String,
}

impl From<PairIn> for RawCard {
    fn from(p: PairIn) -> Self {
        RawCard::new(p.question, p.answer)
    }
}

/// `POST /cards` takes one pair or an array of pairs.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum CreateIn {
    One(PairIn),
    Many(Vec<PairIn>),
}

impl CreateIn {
    pub fn into_batch(self) -> Vec<RawCard> {
        match self {
            CreateIn::One(p) => vec![p.into()],
            CreateIn::Many(v) => v.into_iter().map(RawCard::from).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum QualityIn {
    Number(i32),
    Text(String),
}

impl QualityIn {
    pub fn parse(&self) -> Option<Quality> {
        match self {
            QualityIn::Number(n) => Some(Quality(*n)),
            QualityIn::Text(s) => Quality::parse(s),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewIn {
    pub card_id: CardId,
    pub quality: QualityIn,
}

#[derive(Deserialize)]
pub struct GenerateIn {
    pub text: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct DueQuery {
    pub max: Option<usize>,
}
