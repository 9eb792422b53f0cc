use axum::{
    routing::{get, post, put},
    Router,
};
use recall_core::Session;
use recall_gen::CardGenerator;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::routes::{
    create_cards, delete_card, due_cards, edit_card, generate, list_cards, post_review, reset_card, stats, AppState,
};
use crate::cli::commands::RemoteFeed;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/cards", get(list_cards).post(create_cards))
        .route("/cards/:id", put(edit_card).delete(delete_card))
        .route("/cards/:id/reset", post(reset_card))
        .route("/due", get(due_cards))
        .route("/review", post(post_review))
        .route("/stats", get(stats))
        .route("/generate", post(generate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(
    session: Session,
    generator: Option<Arc<dyn CardGenerator>>,
    remote: Option<RemoteFeed>,
    addr: SocketAddr,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        session: Mutex::new(session),
        generator,
    });

    if let Some(mut rx) = remote {
        let st = state.clone();
        tokio::spawn(async move {
            while let Some(cards) = rx.recv().await {
                st.session.lock().await.on_remote_update(cards);
            }
        });
    }

    let app = router(state);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "api listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
