use async_trait::async_trait;

use agenda_types::Identity;

use crate::error::{ServerError, ServerResult};

/// What a request presented to identify its caller.
#[derive(Clone, Debug)]
pub enum Credentials {
    /// Value of the caller header.
    Caller(String),
    Anonymous,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Turns request credentials into a caller identity.
///
/// `authenticate` returns `None` for an anonymous request; `authorize`
/// decides whether that caller may perform the action at all. Ownership and
/// invitee checks happen later, in the ledger.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Option<Identity>>;
    async fn authorize(&self, identity: Option<&Identity>, action: Action) -> ServerResult<bool>;
}

/// Trusts the caller header as given.
///
/// Accepts a 64-hex identity (optionally `id:`-prefixed) or a handle, which
/// is derived into an identity.
pub struct HeaderAuth {
    allow_anonymous_read: bool,
}

impl HeaderAuth {
    pub fn new(allow_anonymous_read: bool) -> Self {
        Self {
            allow_anonymous_read,
        }
    }
}

#[async_trait]
impl AuthProvider for HeaderAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Option<Identity>> {
        match credentials {
            Credentials::Caller(value) => value
                .trim()
                .parse::<Identity>()
                .map(Some)
                .map_err(|e| ServerError::AuthFailed(e.to_string())),
            Credentials::Anonymous => Ok(None),
        }
    }

    async fn authorize(&self, identity: Option<&Identity>, action: Action) -> ServerResult<bool> {
        Ok(identity.is_some() || (action == Action::Read && self.allow_anonymous_read))
    }
}
