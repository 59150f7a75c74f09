//! Authenticated session
//!
//! `Session` owns the token store, the auth-change channel and the HTTP
//! client, and is the only way resource services reach the API. It keeps
//! every request carrying a usable bearer token:
//!
//! - tokens expiring within five minutes are refreshed before use
//! - concurrent refreshes share a single exchange with the backend
//! - a 401 on a request triggers one refresh and one retry, never more
//! - a failed refresh logs the session out and notifies subscribers
//!
//! HTTP statuses are never turned into errors here; callers get the response
//! as received (or a local 401 when there is no usable token).

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use taskman_protocol::{RefreshTokenRequest, RefreshTokenResponse, TokenPair};

use crate::client::{ApiRequest, ApiResponse, BaseClient};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::events::{AuthChange, AuthNotifier};
use crate::store::TokenStore;
use crate::token;

pub const REFRESH_PATH: &str = "/api/auth/token/refresh/";

type RefreshFuture = Shared<BoxFuture<'static, Option<String>>>;

struct InFlight {
    generation: u64,
    future: RefreshFuture,
}

struct SessionInner {
    http: BaseClient,
    store: Arc<TokenStore>,
    notifier: AuthNotifier,
    rotates_refresh_token: bool,
    in_flight: Mutex<Option<InFlight>>,
    generation: AtomicU64,
}

/// What a refresh exchange needs, detached from the session that started it
///
/// The exchange future is parked in `SessionInner::in_flight`, so it must not
/// own the session state.
struct Exchange {
    http: BaseClient,
    store: Arc<TokenStore>,
    notifier: AuthNotifier,
    rotates_refresh_token: bool,
}

/// Clears the in-flight slot when the exchange that owns it finishes or is dropped
struct InFlightGuard {
    inner: Weak<SessionInner>,
    generation: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut slot = inner.lock_in_flight();
        if slot
            .as_ref()
            .is_some_and(|in_flight| in_flight.generation == self.generation)
        {
            *slot = None;
        }
    }
}

/// Handle to an authenticated session; clones share all state
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("api_base", &self.inner.http.config().api_base)
            .field("store", &self.inner.store.storage_path())
            .finish()
    }
}

impl Session {
    /// Open the token store described by `config` and build a session on it
    pub fn new(config: ClientConfig) -> Result<Self> {
        let store = TokenStore::open(config.token_storage.clone().into())?;
        Self::with_store(config, Arc::new(store))
    }

    /// Build a session on an existing store
    pub fn with_store(config: ClientConfig, store: Arc<TokenStore>) -> Result<Self> {
        let rotates_refresh_token = config.rotates_refresh_token;
        let http = BaseClient::new(config)?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                http,
                store,
                notifier: AuthNotifier::new(),
                rotates_refresh_token,
                in_flight: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.http.config()
    }

    pub fn http(&self) -> &BaseClient {
        &self.inner.http
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.inner.store
    }

    pub fn notifier(&self) -> &AuthNotifier {
        &self.inner.notifier
    }

    /// Receive auth-change notifications until the receiver is dropped
    pub fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.inner.notifier.subscribe()
    }

    /// Exchange the refresh token for a new access token
    ///
    /// Callers arriving while an exchange is running await that exchange
    /// and get its result. Returns `None` when there is no refresh token,
    /// the backend rejects it, or the exchange fails in transit.
    pub async fn refresh(&self) -> Option<String> {
        let future = {
            let mut slot = self.inner.lock_in_flight();
            match slot.as_ref() {
                Some(in_flight) => {
                    debug!("joining in-flight token refresh");
                    in_flight.future.clone()
                }
                None => {
                    let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    let guard = InFlightGuard {
                        inner: Arc::downgrade(&self.inner),
                        generation,
                    };
                    let exchange = self.inner.exchange();
                    let future = async move {
                        let _guard = guard;
                        exchange.exchange_refresh_token().await
                    }
                    .boxed()
                    .shared();
                    *slot = Some(InFlight {
                        generation,
                        future: future.clone(),
                    });
                    future
                }
            }
        };
        future.await
    }

    /// Stored access token, refreshed first if it is expired or about to be
    ///
    /// `None` when the store is disabled, holds no access token, or the
    /// refresh fails.
    pub async fn valid_access_token(&self) -> Option<String> {
        let store = &self.inner.store;
        if !store.is_enabled() {
            return None;
        }

        let access_token = store.access_token()?;

        if token::is_expired_or_expiring_soon(Some(&access_token)) {
            debug!("access token expired or expiring soon");
            return self.refresh().await;
        }

        Some(access_token)
    }

    /// Send `request` with a valid bearer token
    ///
    /// Without a usable token a local 401 `{"detail":"Authentication
    /// required"}` is returned and nothing is sent. A 401 from the server
    /// triggers one refresh; on success the request is retried once and that
    /// response returned, on failure the session is cleared and the original
    /// 401 returned. Only transport failures of the request itself are `Err`.
    pub async fn authenticated_fetch(&self, request: ApiRequest) -> Result<ApiResponse> {
        let Some(access_token) = self.valid_access_token().await else {
            debug!(url = %request.url, "no usable token, skipping request");
            return Ok(ApiResponse::unauthenticated());
        };

        let response = self.inner.http.send(&request, Some(&access_token)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(url = %request.url, "token rejected, refreshing once");
        match self.refresh().await {
            Some(new_token) => self.inner.http.send(&request, Some(&new_token)).await,
            None => {
                clear_tokens(&self.inner.store, &self.inner.notifier, AuthChange::Rejected);
                Ok(response)
            }
        }
    }

    /// Headers for callers building their own requests
    pub async fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(access_token) = self.valid_access_token().await {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", access_token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    /// Whether the stored access token is still unexpired
    ///
    /// No refresh is attempted. A stored token that is expired or unreadable
    /// is removed together with the refresh token.
    pub fn is_authenticated(&self) -> bool {
        let store = &self.inner.store;
        let Some(access_token) = store.access_token() else {
            return false;
        };
        if token::is_unexpired_at(&access_token, chrono::Utc::now()) {
            return true;
        }
        if let Err(e) = store.clear_tokens() {
            warn!("Failed to clear expired tokens: {}", e);
        }
        false
    }

    /// Persist tokens from a login or signup response
    pub fn store_login(&self, tokens: &TokenPair, temp_password_used: bool) -> Result<()> {
        let store = &self.inner.store;
        store.store_tokens(&tokens.access, Some(&tokens.refresh))?;
        store.set_must_change_password(temp_password_used)?;
        info!("session started");
        self.inner.notifier.notify(AuthChange::LoggedIn);
        Ok(())
    }

    /// Forget every stored value and notify subscribers
    pub fn logout(&self) -> Result<()> {
        self.inner.store.clear()?;
        info!("session ended");
        self.inner.notifier.notify(AuthChange::LoggedOut);
        Ok(())
    }

    /// Pick up changes another process made to the persisted store
    ///
    /// Returns whether anything changed; subscribers are notified if so.
    pub fn resync(&self) -> Result<bool> {
        let changed = self.inner.store.reload()?;
        if changed {
            self.inner.notifier.notify(AuthChange::External);
        }
        Ok(changed)
    }
}

impl SessionInner {
    fn lock_in_flight(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn exchange(&self) -> Exchange {
        Exchange {
            http: self.http.clone(),
            store: Arc::clone(&self.store),
            notifier: self.notifier.clone(),
            rotates_refresh_token: self.rotates_refresh_token,
        }
    }
}

fn clear_tokens(store: &TokenStore, notifier: &AuthNotifier, change: AuthChange) {
    if let Err(e) = store.clear_tokens() {
        warn!("Failed to clear tokens: {}", e);
    }
    notifier.notify(change);
}

impl Exchange {
    async fn exchange_refresh_token(&self) -> Option<String> {
        let Some(refresh_token) = self.store.refresh_token() else {
            debug!("no refresh token stored");
            return None;
        };

        let request = match ApiRequest::post(REFRESH_PATH).json(&RefreshTokenRequest {
            refresh: refresh_token,
        }) {
            Ok(request) => request,
            Err(e) => {
                warn!("Error building refresh request: {}", e);
                return None;
            }
        };

        let response = match self.http.send(&request, None).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Error refreshing token: {}", e);
                return None;
            }
        };

        if !response.is_success() {
            info!(status = %response.status(), "refresh token rejected");
            clear_tokens(&self.store, &self.notifier, AuthChange::RefreshFailed);
            return None;
        }

        let body: RefreshTokenResponse = match response.json() {
            Ok(body) => body,
            Err(e) => {
                warn!("Error refreshing token: {}", e);
                return None;
            }
        };

        let Some(access) = body.access else {
            warn!("refresh response carried no access token");
            return None;
        };

        let rotated = if self.rotates_refresh_token {
            body.refresh.as_deref()
        } else {
            None
        };
        if let Err(e) = self.store.store_tokens(&access, rotated) {
            warn!("Failed to persist refreshed tokens: {}", e);
        }

        debug!(rotated = rotated.is_some(), "access token refreshed");
        self.notifier.notify(AuthChange::Refreshed);
        Some(access)
    }
}
