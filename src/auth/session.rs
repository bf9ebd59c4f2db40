//! Session lifecycle - login, refresh, logout and forced logout
//!
//! Every call here goes straight through the [`Dispatcher`], never through
//! the auth interceptor, so a failing login or refresh cannot recurse into
//! another refresh.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{ClientConfig, LogoutMode, RefreshCoordination};
use crate::error::{ClientError, ErrorCode};
use crate::events::{ClientEvent, LogoutReason};
use crate::http::envelope::{decode_response, ApiResult};
use crate::http::{Dispatcher, Method, PendingRequest};
use crate::security::Sanitizer;

use super::token_store::{TokenStore, UserInfo};

const MAX_USERNAME_LEN: usize = 128;

/// A request for the application to change route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationIntent {
    pub route: String,
}

impl NavigationIntent {
    pub fn to(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
        }
    }
}

/// Result of [`SessionLifecycle::logout`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutOutcome {
    /// `None` when the server was not contacted, otherwise whether it
    /// accepted the logout
    pub server_notified: Option<bool>,
}

/// Token fields of a login or refresh `data` payload
#[derive(Debug, Default, Deserialize)]
struct TokenGrant {
    access_token: Option<String>,
    token: Option<String>,
    refresh_token: Option<String>,
}

impl TokenGrant {
    fn from_data(data: &Value) -> Self {
        serde_json::from_value(data.clone()).unwrap_or_default()
    }

    fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .or(self.token.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// Login, logout and token refresh
pub struct SessionLifecycle {
    dispatcher: Arc<Dispatcher>,
    config: Arc<ClientConfig>,
    current_route: Mutex<Option<String>>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl SessionLifecycle {
    pub fn new(dispatcher: Arc<Dispatcher>, config: Arc<ClientConfig>) -> Self {
        Self {
            dispatcher,
            config,
            current_route: Mutex::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        self.dispatcher.tokens()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens().is_authenticated()
    }

    /// The signed-in user, if the stored session is valid
    pub fn current_user(&self) -> Option<UserInfo> {
        self.tokens().get().and_then(|c| c.user)
    }

    /// Tells the session which route the application is showing
    pub fn set_current_route(&self, route: impl Into<String>) {
        if let Ok(mut current) = self.current_route.lock() {
            *current = Some(route.into());
        }
    }

    pub fn current_route(&self) -> Option<String> {
        self.current_route.lock().ok().and_then(|r| r.clone())
    }

    /// Signs in with username and password
    ///
    /// On success the access token, user info and (if supplied) refresh
    /// token are stored. The server's answer is returned either way.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult {
        if let Err(e) = Sanitizer::validate_username(username, MAX_USERNAME_LEN) {
            return ApiResult::Err {
                code: ErrorCode::Api("INVALID_INPUT".to_string()),
                message: e.to_string(),
            };
        }

        tracing::info!("Logging in as {}", username);

        let mut request = PendingRequest::new(Method::Post, self.config.login_path.clone())
            .with_body(json!({ "username": username, "password": password }));

        let result = ApiResult::from_outcome(self.send(&mut request).await);

        if let ApiResult::Ok { data, .. } = &result {
            let grant = TokenGrant::from_data(data);
            let Some(access_token) = grant.access_token() else {
                tracing::warn!("Login succeeded but no access token was returned");
                return result;
            };

            let user = data
                .get(&self.config.user_field)
                .or_else(|| data.get("user"))
                .filter(|v| !v.is_null())
                .and_then(|v| serde_json::from_value::<UserInfo>(v.clone()).ok());

            if let Err(e) = self
                .tokens()
                .set(access_token, user.as_ref(), grant.refresh_token.as_deref())
            {
                tracing::error!("Failed to persist login: {}", e);
                return ApiResult::from_error(&ClientError::Storage(e));
            }

            tracing::info!("Login succeeded, credentials stored");
            self.leave_login_route();
            self.dispatcher.events().emit(ClientEvent::LoggedIn(user));
        }

        result
    }

    /// Ends the session
    ///
    /// In [`LogoutMode::NotifyServer`] the server is told first; its answer
    /// does not affect the local outcome.
    pub async fn logout(&self) -> LogoutOutcome {
        let server_notified = match self.config.logout_mode {
            LogoutMode::LocalOnly => None,
            LogoutMode::NotifyServer => {
                let mut request =
                    PendingRequest::new(Method::Post, self.config.logout_path.clone());
                match self.send(&mut request).await {
                    Ok(_) => Some(true),
                    Err(e) => {
                        tracing::warn!("Server logout failed: {}", e);
                        Some(false)
                    }
                }
            }
        };

        tracing::info!("Logging out, clearing credentials");
        if let Err(e) = self.tokens().clear() {
            tracing::error!("Failed to clear credentials on logout: {}", e);
        }
        self.dispatcher
            .events()
            .emit(ClientEvent::LoggedOut(LogoutReason::UserRequested));

        LogoutOutcome { server_notified }
    }

    /// Exchanges the stored refresh token for a new access token
    ///
    /// Any failure ends the session (see [`SessionLifecycle::expire`]) and
    /// comes back as [`ClientError::AuthFailed`].
    pub async fn refresh(&self) -> Result<(), ClientError> {
        tracing::info!("Attempting token refresh");

        let Some(refresh_token) = self.tokens().refresh_token() else {
            tracing::warn!("No refresh token stored; login required");
            return Err(self.fail(LogoutReason::RefreshFailed, "No refresh token"));
        };

        let mut request = PendingRequest::new(Method::Post, self.config.refresh_path.clone())
            .with_body(json!({ "refresh_token": refresh_token }));

        let data = match self.send(&mut request).await.map(ApiResult::from_success_body) {
            Ok(ApiResult::Ok { data, .. }) => data,
            Ok(ApiResult::Err { message, .. }) => {
                tracing::warn!("Token refresh rejected: {}", message);
                return Err(self.fail(LogoutReason::RefreshFailed, &message));
            }
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                return Err(self.fail(LogoutReason::RefreshFailed, &e.to_string()));
            }
        };

        let grant = TokenGrant::from_data(&data);
        let Some(access_token) = grant.access_token() else {
            tracing::warn!("Token refresh returned no access token");
            return Err(self.fail(LogoutReason::RefreshFailed, "No access token in refresh response"));
        };

        if let Err(e) = self
            .tokens()
            .set(access_token, None, grant.refresh_token.as_deref())
        {
            tracing::error!("Failed to persist refreshed token: {}", e);
            return Err(self.fail(LogoutReason::RefreshFailed, &e.to_string()));
        }

        tracing::info!(
            "Token refresh succeeded ({})",
            Sanitizer::sanitize_token(access_token)
        );
        self.dispatcher.events().emit(ClientEvent::TokenRefreshed);
        Ok(())
    }

    /// Refreshes on behalf of a request that was sent with `sent_token`
    ///
    /// With [`RefreshCoordination::SingleFlight`] refreshes are serialized,
    /// and a caller whose token was already rotated while it waited skips
    /// its own refresh.
    pub async fn refresh_for(&self, sent_token: Option<&str>) -> Result<(), ClientError> {
        match self.config.refresh_coordination {
            RefreshCoordination::Independent => self.refresh().await,
            RefreshCoordination::SingleFlight => {
                let _guard = self.refresh_lock.lock().await;
                match self.tokens().access_token() {
                    Some(current) if Some(current.as_str()) != sent_token => {
                        tracing::debug!("Access token already rotated; reusing it");
                        Ok(())
                    }
                    _ => self.refresh().await,
                }
            }
        }
    }

    /// Ends the session after an unrecoverable authentication failure
    ///
    /// Clears credentials and, unless the application is already on the
    /// login route, returns (and emits) a navigation to it.
    pub fn expire(&self, reason: LogoutReason) -> Option<NavigationIntent> {
        tracing::warn!("Session expired ({:?}); clearing credentials", reason);

        if let Err(e) = self.tokens().clear() {
            tracing::error!("Failed to clear credentials: {}", e);
        }
        self.dispatcher.events().emit(ClientEvent::LoggedOut(reason));

        let intent = {
            let mut current = match self.current_route.lock() {
                Ok(current) => current,
                Err(poisoned) => poisoned.into_inner(),
            };
            if current.as_deref() == Some(self.config.login_route.as_str()) {
                None
            } else {
                *current = Some(self.config.login_route.clone());
                Some(NavigationIntent::to(self.config.login_route.clone()))
            }
        };

        if let Some(intent) = &intent {
            self.dispatcher
                .events()
                .emit(ClientEvent::Navigate(intent.clone()));
        }
        intent
    }

    /// Forgets a tracked login route once a new session exists
    ///
    /// The application moves on after signing in, so a later expiry must
    /// navigate again even if no route was reported in between.
    fn leave_login_route(&self) {
        let mut current = match self.current_route.lock() {
            Ok(current) => current,
            Err(poisoned) => poisoned.into_inner(),
        };
        if current.as_deref() == Some(self.config.login_route.as_str()) {
            *current = None;
        }
    }

    /// Expires the session and builds the error handed to the caller
    pub(crate) fn fail(&self, reason: LogoutReason, message: &str) -> ClientError {
        let navigation = self.expire(reason);
        ClientError::AuthFailed {
            message: message.to_string(),
            navigation,
        }
    }

    /// One uninterrupted round trip, decoded strictly
    async fn send(&self, request: &mut PendingRequest) -> Result<Value, ClientError> {
        let response = self.dispatcher.dispatch(request).await?;
        decode_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::transport::{MockTransport, RawResponse};
    use crate::testing::session_with;

    #[tokio::test]
    async fn test_login_stores_token_and_user() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.path == "/admin/auth/login"
                    && req.body == Some(json!({"username": "admin", "password": "pw"}))
            })
            .times(1)
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({
                        "success": true,
                        "data": {
                            "access_token": "A1",
                            "admin": { "username": "admin", "role": "owner" }
                        }
                    }),
                ))
            });

        let session = session_with(transport, ClientConfig::default());
        let result = session.login("admin", "pw").await;

        assert!(result.is_ok());
        let creds = session.tokens().get().unwrap();
        assert_eq!(creds.access_token(), "A1");
        assert_eq!(creds.refresh_token(), None);
        assert_eq!(
            creds.user,
            Some(UserInfo::new("admin").with_role("owner"))
        );
    }

    #[tokio::test]
    async fn test_login_failure_returns_server_answer() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(RawResponse::json(
                401,
                &json!({"success": false, "message": "invalid credentials"}),
            ))
        });

        let session = session_with(transport, ClientConfig::default());
        let result = session.login("admin", "wrong").await;

        assert_eq!(
            result,
            ApiResult::Err {
                code: ErrorCode::Status(401),
                message: "invalid credentials".into()
            }
        );
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_rejects_blank_username_without_network() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let session = session_with(transport, ClientConfig::default());
        let result = session.login("  ", "pw").await;
        assert_eq!(result.code(), Some(&ErrorCode::Api("INVALID_INPUT".into())));
    }

    #[tokio::test]
    async fn test_refresh_without_token_makes_no_call() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let session = session_with(transport, ClientConfig::default());
        session.tokens().set("expired", None, None).unwrap();

        let err = session.refresh().await.unwrap_err();
        assert!(err.is_auth_failure());
        assert_eq!(err.navigation(), Some(&NavigationIntent::to("/admin/login")));
        assert_eq!(session.tokens().access_token(), None);
    }

    #[tokio::test]
    async fn test_refresh_rotates_tokens() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "/auth/refresh" && req.body == Some(json!({"refresh_token": "R1"})))
            .times(1)
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"success": true, "data": {"access_token": "T2", "refresh_token": "T3"}}),
                ))
            });

        let session = session_with(transport, ClientConfig::default());
        session
            .tokens()
            .set("T1", Some(&UserInfo::new("admin")), Some("R1"))
            .unwrap();

        session.refresh().await.unwrap();

        assert_eq!(session.tokens().access_token(), Some("T2".into()));
        assert_eq!(session.tokens().refresh_token(), Some("T3".into()));
        assert_eq!(session.current_user(), Some(UserInfo::new("admin")));
    }

    #[tokio::test]
    async fn test_refresh_accepts_token_field() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(RawResponse::json(
                200,
                &json!({"success": true, "data": {"token": "T2"}}),
            ))
        });

        let session = session_with(transport, ClientConfig::default());
        session.tokens().set("T1", None, Some("R1")).unwrap();
        session.refresh().await.unwrap();

        assert_eq!(session.tokens().access_token(), Some("T2".into()));
        assert_eq!(session.tokens().refresh_token(), Some("R1".into()));
    }

    #[tokio::test]
    async fn test_refresh_rejection_expires_session() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(RawResponse::json(200, &json!({"success": false}))));

        let session = session_with(transport, ClientConfig::default());
        session
            .tokens()
            .set("T1", Some(&UserInfo::new("admin")), Some("R1"))
            .unwrap();

        assert!(session.refresh().await.unwrap_err().is_auth_failure());
        assert_eq!(session.tokens().access_token(), None);
        assert_eq!(session.tokens().refresh_token(), None);
    }

    #[tokio::test]
    async fn test_expire_navigates_once() {
        let session = session_with(MockTransport::new(), ClientConfig::default());
        session.set_current_route("/admin/dashboard");

        assert_eq!(
            session.expire(LogoutReason::RefreshFailed),
            Some(NavigationIntent::to("/admin/login"))
        );
        assert_eq!(session.expire(LogoutReason::RefreshFailed), None);
        assert_eq!(session.current_route().as_deref(), Some("/admin/login"));
    }

    #[tokio::test]
    async fn test_login_after_expiry_navigates_again() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(RawResponse::json(
                200,
                &json!({"success": true, "data": {"access_token": "A2"}}),
            ))
        });

        let session = session_with(transport, ClientConfig::default());
        session.set_current_route("/admin/dashboard");
        assert!(session.expire(LogoutReason::RefreshFailed).is_some());

        assert!(session.login("admin", "pw").await.is_ok());
        assert_eq!(session.current_route(), None);
        assert_eq!(
            session.expire(LogoutReason::RetryRejected),
            Some(NavigationIntent::to("/admin/login"))
        );
    }

    #[tokio::test]
    async fn test_expire_on_login_route_does_not_navigate() {
        let session = session_with(MockTransport::new(), ClientConfig::default());
        session.set_current_route("/admin/login");
        assert_eq!(session.expire(LogoutReason::RefreshFailed), None);
    }

    #[tokio::test]
    async fn test_local_logout_makes_no_call() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let session = session_with(transport, ClientConfig::default());
        session
            .tokens()
            .set("T1", Some(&UserInfo::new("admin")), Some("R1"))
            .unwrap();

        let outcome = session.logout().await;
        assert_eq!(outcome.server_notified, None);
        assert!(!session.is_authenticated());
        assert_eq!(session.tokens().refresh_token(), None);
    }

    #[tokio::test]
    async fn test_server_logout_clears_even_on_failure() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "/auth/logout" && req.bearer() == Some("T1"))
            .times(1)
            .returning(|_| Ok(RawResponse::new(500, "")));

        let config = ClientConfig {
            logout_mode: LogoutMode::NotifyServer,
            ..Default::default()
        };
        let session = session_with(transport, config);
        session
            .tokens()
            .set("T1", Some(&UserInfo::new("admin")), None)
            .unwrap();

        let outcome = session.logout().await;
        assert_eq!(outcome.server_notified, Some(false));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_single_flight_skips_refresh_when_rotated() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let config = ClientConfig {
            refresh_coordination: RefreshCoordination::SingleFlight,
            ..Default::default()
        };
        let session = session_with(transport, config);
        session.tokens().set("T2", None, Some("R2")).unwrap();

        // The failed request went out with T1; T2 is already in place.
        session.refresh_for(Some("T1")).await.unwrap();
        assert_eq!(session.tokens().access_token(), Some("T2".into()));
    }
}
