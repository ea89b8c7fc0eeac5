//! The auth session controller: the single source of truth for "is this
//! user logged in", consumed by route guards and request decoration.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use incentive_core::{CredentialStore, User, token};
use incentive_http::types::{LoginRequest, RefreshTokenRequest, RefreshTokenResponse};
use incentive_http::{AuthClient, ClientError};
use tokio::sync::watch;

use crate::config::SessionConfig;
use crate::engine::RefreshEngine;
use crate::error::SessionError;
use crate::events::{LogoutReason, Navigation, SessionEvent};

/// In-memory authentication state.
///
/// The user record and bearer token are present together or not at all;
/// "authenticated" means exactly "an `ActiveSession` exists".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub user: User,
    pub token: String,
}

/// Coordinates the credential store, the auth endpoints, and the refresh
/// engine behind a `login`/`logout`/`bootstrap` surface.
pub struct SessionController {
    inner: Arc<ControllerInner>,
}

pub(crate) struct ControllerInner {
    config: SessionConfig,
    client: AuthClient,
    store: Arc<dyn CredentialStore>,
    session: RwLock<Option<ActiveSession>>,
    // Bumped whenever a session is installed or destroyed; a refresh that
    // completes under an older generation is discarded.
    generation: AtomicU64,
    refresh_in_flight: AtomicBool,
    pub(crate) engine: RefreshEngine,
    events: watch::Sender<SessionEvent>,
}

impl SessionController {
    /// Create a controller over the given credential store.
    pub fn new(
        config: SessionConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, SessionError> {
        let mut builder = AuthClient::builder()
            .base_url(&config.base_url)
            .timeout(config.request_timeout());
        if let Some(tenant_id) = &config.tenant_id {
            builder = builder.tenant_id(tenant_id);
        }
        let client = builder.build()?;

        let (events, _) = watch::channel(SessionEvent::Idle);

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                store,
                session: RwLock::new(None),
                generation: AtomicU64::new(0),
                refresh_in_flight: AtomicBool::new(false),
                engine: RefreshEngine::new(),
                events,
            }),
        })
    }

    /// Whether a session is currently established.
    pub fn is_authenticated(&self) -> bool {
        self.inner.read_session().is_some()
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Option<User> {
        self.inner.read_session().map(|s| s.user)
    }

    /// The current bearer token, if any, for request decoration.
    pub fn token(&self) -> Option<String> {
        self.inner.read_session().map(|s| s.token)
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> watch::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Authenticate with the backend.
    ///
    /// Returns `Ok(false)` when the backend rejects the credentials (an
    /// expected outcome, nothing is stored) and `Err` for transport or
    /// storage failures so the caller can distinguish "wrong password" from
    /// "something went wrong".
    pub async fn login(&self, username: &str, password: &str) -> Result<bool, SessionError> {
        let request = LoginRequest {
            user_name: username.to_string(),
            password: password.to_string(),
        };

        let response = match self.inner.client.login(request).await {
            Ok(response) => response,
            Err(ClientError::AuthenticationFailed(message) | ClientError::BadRequest(message)) => {
                tracing::info!("login rejected: {message}");
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        };

        // Fields the backend may omit fall back to what the form gave us.
        let user = User {
            user_id: response
                .user_id
                .unwrap_or_else(|| username.to_string()),
            email: response.email.unwrap_or_else(|| username.to_string()),
            roles: response.roles.unwrap_or_else(|| vec!["User".to_string()]),
        };
        let refresh_token = response.refresh_token.unwrap_or_default();

        self.inner
            .persist_credentials(&response.token, &refresh_token, &user)
            .await?;
        self.inner.install_session(user, response.token);
        self.inner
            .engine
            .arm(Arc::downgrade(&self.inner), self.inner.config.refresh_interval());
        self.inner.events.send_replace(SessionEvent::LoggedIn);

        tracing::info!("login succeeded, session established");
        Ok(true)
    }

    /// End the session: clear the store, the in-memory state, and the
    /// refresh timer. Idempotent; calling it while logged out is a no-op
    /// apart from re-publishing the logged-out event.
    pub async fn logout(&self) {
        self.inner.force_logout(LogoutReason::UserRequested).await;
    }

    /// Adopt a persisted session at startup.
    ///
    /// A fresh stored token is adopted directly; a stale one is exchanged
    /// once before adoption. Anything missing or corrupt clears the store
    /// defensively and leaves the controller unauthenticated.
    pub async fn bootstrap(&self) -> Result<Navigation, SessionError> {
        let stored_token = self.inner.store.auth_token().await?;
        let stored_user = self.inner.store.user_data().await?;

        let (Some(stored_token), Some(user)) = (stored_token, stored_user) else {
            self.inner.store.clear_auth_data().await?;
            return Ok(Navigation::ToLogin);
        };

        let adopted_token = if token::is_expired(&stored_token, self.inner.config.expiry_buffer_seconds)
        {
            tracing::debug!("stored token is stale, refreshing before adopting");
            match self.inner.exchange_stored_pair().await {
                Ok(pair) => {
                    self.inner.persist_refreshed(&pair).await?;
                    pair.token
                }
                Err(err) => {
                    tracing::warn!("bootstrap refresh failed, clearing stored session: {err}");
                    self.inner.store.clear_auth_data().await?;
                    return Ok(Navigation::ToLogin);
                }
            }
        } else {
            stored_token
        };

        self.inner.install_session(user, adopted_token);
        self.inner
            .engine
            .arm(Arc::downgrade(&self.inner), self.inner.config.refresh_interval());
        self.inner.events.send_replace(SessionEvent::LoggedIn);

        tracing::info!("persisted session adopted");
        Ok(Navigation::ToDashboard)
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &ControllerInner {
        &self.inner
    }
}

impl ControllerInner {
    fn read_session(&self) -> Option<ActiveSession> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the in-memory session in one step. The generation bump
    /// invalidates any refresh still in flight for the previous session.
    fn install_session(&self, user: User, token: String) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        // An aborted timer task cannot clear its own in-flight flag.
        self.refresh_in_flight.store(false, Ordering::SeqCst);
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        *session = Some(ActiveSession { user, token });
    }

    /// Write all four credential fields, back to back so no reader of the
    /// store observes a token without its companion fields for longer than
    /// one write cycle.
    async fn persist_credentials(
        &self,
        token: &str,
        refresh_token: &str,
        user: &User,
    ) -> Result<(), SessionError> {
        self.store.set_auth_token(token).await?;
        self.store.set_refresh_token(refresh_token).await?;
        self.store.set_user_data(user).await?;
        self.store.set_last_login().await?;
        Ok(())
    }

    /// Call the refresh endpoint with the stored pair. Network only; the
    /// caller decides whether the result may be persisted.
    async fn exchange_stored_pair(&self) -> Result<RefreshTokenResponse, SessionError> {
        let token = self
            .store
            .auth_token()
            .await?
            .ok_or(SessionError::MissingCredentials)?;
        let refresh_token = self
            .store
            .refresh_token()
            .await?
            .ok_or(SessionError::MissingCredentials)?;

        let response = self
            .client
            .refresh_token(RefreshTokenRequest {
                token,
                refresh_token,
            })
            .await?;
        Ok(response)
    }

    /// Persist a refreshed pair; the user record is unchanged.
    async fn persist_refreshed(&self, pair: &RefreshTokenResponse) -> Result<(), SessionError> {
        self.store.set_auth_token(&pair.token).await?;
        self.store.set_refresh_token(&pair.refresh_token).await?;
        self.store.set_last_login().await?;
        Ok(())
    }

    /// One refresh engine pass.
    ///
    /// No-ops while the token is fresh or while another refresh is already
    /// in flight. A refresh outcome is only applied if the session it was
    /// started for is still the live one.
    pub(crate) async fn tick(&self) {
        let Some(current) = self.read_session() else {
            return;
        };
        if !token::is_expired(&current.token, self.config.expiry_buffer_seconds) {
            return;
        }
        if self.refresh_in_flight.swap(true, Ordering::SeqCst) {
            return;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        tracing::debug!("token within expiry buffer, refreshing");
        let outcome = self.exchange_stored_pair().await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("discarding refresh outcome for a superseded session");
            self.refresh_in_flight.store(false, Ordering::SeqCst);
            return;
        }

        match outcome {
            Ok(pair) => {
                if let Err(err) = self.persist_refreshed(&pair).await {
                    tracing::warn!("failed to persist refreshed credentials: {err}");
                }
                let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
                if let Some(active) = session.as_mut() {
                    active.token = pair.token;
                }
                drop(session);
                tracing::debug!("token refreshed");
            }
            Err(err) => {
                tracing::warn!("token refresh failed, forcing logout: {err}");
                self.force_logout(LogoutReason::SessionExpired).await;
            }
        }

        self.refresh_in_flight.store(false, Ordering::SeqCst);
    }

    /// Tear the session down from any state: timer, in-memory state, store.
    pub(crate) async fn force_logout(&self, reason: LogoutReason) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.engine.disarm();
        self.refresh_in_flight.store(false, Ordering::SeqCst);

        {
            let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
            *session = None;
        }

        if let Err(err) = self.store.clear_auth_data().await {
            tracing::warn!("failed to clear stored credentials on logout: {err}");
        }

        self.events.send_replace(SessionEvent::LoggedOut { reason });
        tracing::info!(?reason, "session ended");
    }
}
