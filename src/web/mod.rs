//! Browser front end: one page plus a small JSON API.

mod handlers;
pub mod page;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use handlers::create_router;

use crate::conversation::{ChatService, SessionStore};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(chat: ChatService, window_size: usize, session_idle: Duration) -> Self {
        Self {
            chat: Arc::new(chat),
            sessions: Arc::new(SessionStore::new(window_size, session_idle)),
        }
    }
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let sessions = state.sessions.clone();
    let app = create_router(state).layer(TraceLayer::new_for_http());

    info!("MedIA listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let sweeper = tokio::spawn(async move {
        let mut ticks = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticks.tick().await;
            sessions.sweep_idle().await;
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    sweeper.abort();
    Ok(())
}
