use std::sync::Arc;

use axum::http::HeaderMap;

use agenda_sdk::Agenda;
use agenda_types::Identity;

use crate::auth::{Action, AuthProvider, Credentials};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub agenda: Arc<Agenda>,
    pub auth: Arc<dyn AuthProvider>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(agenda: Arc<Agenda>, auth: Arc<dyn AuthProvider>, config: ServerConfig) -> Self {
        Self {
            agenda,
            auth,
            config: Arc::new(config),
        }
    }

    fn credentials(&self, headers: &HeaderMap) -> ServerResult<Credentials> {
        match headers.get(self.config.caller_header.as_str()) {
            None => Ok(Credentials::Anonymous),
            Some(value) => value
                .to_str()
                .map(|s| Credentials::Caller(s.to_string()))
                .map_err(|_| ServerError::AuthFailed("caller header is not ASCII".into())),
        }
    }

    async fn resolve(&self, headers: &HeaderMap, action: Action) -> ServerResult<Option<Identity>> {
        let identity = self.auth.authenticate(&self.credentials(headers)?).await?;
        if !self.auth.authorize(identity.as_ref(), action).await? {
            return Err(ServerError::Unauthenticated);
        }
        Ok(identity)
    }

    /// The caller of a mutating request; required.
    pub async fn caller(&self, headers: &HeaderMap) -> ServerResult<Identity> {
        self.resolve(headers, Action::Write)
            .await?
            .ok_or(ServerError::Unauthenticated)
    }

    /// Admit a read request, with or without a caller.
    pub async fn reader(&self, headers: &HeaderMap) -> ServerResult<Option<Identity>> {
        self.resolve(headers, Action::Read).await
    }
}
