//! Session mock standing in for the hosted auth service.
//!
//! Identity is carried by a caller-owned [`Session`]; the client never holds
//! a "current user". Signing in as someone locally is just
//! `Session::signed_in_as(id)`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{Client, DbError, Query, QueryExecutor, Response};

const USERS_TABLE: &str = "users";

/// The identity a caller is acting as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<String>,
}

impl Session {
    /// A signed-out session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in_as(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn set_user_id(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn clear(&mut self) {
        self.user_id = None;
    }
}

/// Minimal user projection returned by [`Auth::get_user`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthOptions {
    pub provider: String,
    pub redirect_to: Option<String>,
    pub scopes: Option<String>,
}

impl OAuthOptions {
    pub fn provider(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChangeEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Handle returned by [`Auth::on_auth_state_change`].
#[derive(Debug)]
pub struct Subscription {
    _private: (),
}

impl Subscription {
    /// Nothing was registered, so there is nothing to remove.
    pub fn unsubscribe(self) {}
}

/// Auth surface bound to a client.
pub struct Auth<'a, E> {
    client: &'a Client<E>,
}

impl<'a, E: QueryExecutor> Auth<'a, E> {
    pub(crate) fn new(client: &'a Client<E>) -> Self {
        Self { client }
    }

    /// Look up the session's user.
    ///
    /// A signed-out session, or a user id with no row, yields
    /// `data == None, error == None`.
    pub async fn get_user(&self, session: &Session) -> Response<User> {
        let Some(user_id) = session.user_id() else {
            return Response::empty();
        };

        match self.lookup(user_id).await {
            Ok(user) => Response {
                data: user,
                error: None,
                count: None,
            },
            Err(e) => {
                warn!(table = USERS_TABLE, operation = "get_user", error = %e, "user lookup failed");
                Response::failed(e)
            }
        }
    }

    /// Accepted and ignored: the local store performs no OAuth handshake.
    pub async fn sign_in_with_oauth(&self, _session: &Session, options: OAuthOptions) -> Response<()> {
        debug!(provider = %options.provider, "ignoring oauth sign-in for local store");
        Response::empty()
    }

    pub async fn sign_out(&self, session: &mut Session) -> Response<()> {
        debug!(user_id = ?session.user_id(), "signing out");
        session.clear();
        Response::empty()
    }

    /// The local store never emits auth events; the callback is dropped.
    pub fn on_auth_state_change<F>(&self, _callback: F) -> Subscription
    where
        F: FnMut(AuthChangeEvent, Option<&Session>) + Send + 'static,
    {
        Subscription { _private: () }
    }

    async fn lookup(&self, user_id: &str) -> Result<Option<User>, DbError> {
        let query = Query::for_table(USERS_TABLE).eq("id", user_id).limit(1);
        let row = self.client.executor().fetch_optional(&query).await?;
        let Some(row) = self.client.codec().decode(row) else {
            return Ok(None);
        };

        let id = match row.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => user_id.to_string(),
        };
        let email = row.get("email").and_then(Value::as_str).map(str::to_string);

        Ok(Some(User { id, email }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_lifecycle() {
        let mut session = Session::new();
        assert_eq!(session.user_id(), None);

        session.set_user_id(Some("u1".to_string()));
        assert_eq!(session.user_id(), Some("u1"));

        session.clear();
        assert_eq!(session, Session::new());
        assert_eq!(Session::signed_in_as("u2").user_id(), Some("u2"));
    }

    #[test]
    fn oauth_options_provider() {
        let options = OAuthOptions::provider("github");
        assert_eq!(options.provider, "github");
        assert!(options.redirect_to.is_none());
    }
}
