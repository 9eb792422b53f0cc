use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use recall_core::{filter_by_text, Card, CardId, Session, Stats};
use recall_gen::CardGenerator;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::dto::{CreateIn, DueQuery, GenerateIn, ListQuery, PairIn, ReviewIn};
use crate::api::error::ApiError;

pub struct AppState {
    pub session: Mutex<Session>,
    pub generator: Option<Arc<dyn CardGenerator>>,
}

type Shared = State<Arc<AppState>>;

pub async fn list_cards(State(st): Shared, Query(q): Query<ListQuery>) -> Json<Vec<Card>> {
    let session = st.session.lock().await;
    let cards = filter_by_text(session.cards(), q.q.as_deref().unwrap_or(""));
    Json(cards.into_iter().cloned().collect())
}

pub async fn create_cards(
    State(st): Shared,
    Json(body): Json<CreateIn>,
) -> Result<(StatusCode, Json<Vec<Card>>), ApiError> {
    let mut session = st.session.lock().await;
    let created = session.create(body.into_batch(), Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn edit_card(
    State(st): Shared,
    Path(id): Path<CardId>,
    Json(body): Json<PairIn>,
) -> Result<Json<Card>, ApiError> {
    let mut session = st.session.lock().await;
    Ok(Json(session.edit(id, &body.question, &body.answer).await?))
}

pub async fn delete_card(State(st): Shared, Path(id): Path<CardId>) -> Result<StatusCode, ApiError> {
    st.session.lock().await.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset_card(State(st): Shared, Path(id): Path<CardId>) -> Result<Json<Card>, ApiError> {
    let mut session = st.session.lock().await;
    Ok(Json(session.reset(id, Utc::now()).await?))
}

/// Due cards in study order (hard, medium, easy).
pub async fn due_cards(State(st): Shared, Query(q): Query<DueQuery>) -> Json<Vec<Card>> {
    let session = st.session.lock().await;
    let mut queue = session.study_queue(Utc::now());
    if let Some(max) = q.max {
        queue.truncate(max);
    }
    Json(queue.filter_map(|id| session.get(id).cloned()).collect())
}

pub async fn post_review(State(st): Shared, Json(body): Json<ReviewIn>) -> Result<Json<Card>, ApiError> {
    let quality = body
        .quality
        .parse()
        .ok_or_else(|| ApiError::bad_request("quality must be an integer or one of hard/good/easy"))?;
    let mut session = st.session.lock().await;
    Ok(Json(session.rate(body.card_id, quality, Utc::now()).await?))
}

pub async fn stats(State(st): Shared) -> Json<Stats> {
    Json(st.session.lock().await.stats(Utc::now()))
}

pub async fn generate(
    State(st): Shared,
    Json(body): Json<GenerateIn>,
) -> Result<(StatusCode, Json<Vec<Card>>), ApiError> {
    let generator = st
        .generator
        .as_ref()
        .ok_or_else(|| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "card generation is not configured"))?;
    // The model call runs without holding the session.
    let pairs = generator.generate(&body.text).await?;
    let mut session = st.session.lock().await;
    let created = session.create(pairs, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
