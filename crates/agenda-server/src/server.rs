use std::sync::Arc;

use tokio::net::TcpListener;

use agenda_sdk::Agenda;

use crate::auth::{AuthProvider, HeaderAuth};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Agenda HTTP server.
pub struct AgendaServer {
    state: AppState,
}

impl AgendaServer {
    /// Open the configured agenda and trust the caller header.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let agenda = Agenda::open(config.agenda.clone())?;
        Ok(Self::with_agenda(config, Arc::new(agenda)))
    }

    /// Serve an agenda that is already open.
    pub fn with_agenda(config: ServerConfig, agenda: Arc<Agenda>) -> Self {
        let auth = Arc::new(HeaderAuth::new(config.allow_anonymous_read));
        Self::with_auth(config, agenda, auth)
    }

    pub fn with_auth(
        config: ServerConfig,
        agenda: Arc<Agenda>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            state: AppState::new(agenda, auth, config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    pub fn agenda(&self) -> &Arc<Agenda> {
        &self.state.agenda
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let addr = self.state.config.bind_addr;
        let app = self.router();
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, durable = self.state.agenda.is_durable(), "agenda server listening");
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
