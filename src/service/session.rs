use tracing::info;

use super::storage::LocalStore;
use crate::clients::ChronosApi;
use crate::errors::{ChronosError, Result};

pub const TOKEN_KEY: &str = "authToken";

/// Auth context handed to the client explicitly instead of being read from
/// storage on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Reads the persisted token once, at startup.
    pub fn restore(store: &LocalStore) -> Result<Self> {
        let token: Option<String> = store.get(TOKEN_KEY)?;
        Ok(Self {
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn login(store: &LocalStore, token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ChronosError::InvalidInput("token must not be empty".to_string()));
        }
        store.set(TOKEN_KEY, &token)?;
        info!("session token stored");
        Ok(Self::with_token(token))
    }

    pub fn logout(self, store: &LocalStore) -> Result<Session> {
        store.remove(TOKEN_KEY)?;
        info!("session token removed");
        Ok(Session::anonymous())
    }
}

/// Fails with [`ChronosError::Unauthenticated`] carrying the login target
/// when the backend reports no authenticated user.
pub async fn require_auth(api: &dyn ChronosApi, login_url: &str) -> Result<()> {
    let status = api.auth_status().await?;
    if status.is_authenticated {
        Ok(())
    } else {
        Err(ChronosError::Unauthenticated {
            login_url: login_url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_persists_and_restore_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        assert!(!Session::restore(&store).unwrap().is_logged_in());

        let session = Session::login(&store, " tok-1 ").unwrap();
        assert_eq!(session.token(), Some("tok-1"));
        assert_eq!(Session::restore(&store).unwrap(), session);

        let session = session.logout(&store).unwrap();
        assert!(!session.is_logged_in());
        assert!(!Session::restore(&store).unwrap().is_logged_in());
    }

    #[test]
    fn login_rejects_blank_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(matches!(Session::login(&store, "  "), Err(ChronosError::InvalidInput(_))));
    }
}
