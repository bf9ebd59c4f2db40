//! Auth interceptor - the 401 refresh-and-retry state machine
//!
//! ```text
//! NORMAL --401, eligible--> REFRESHING --ok--> RETRY_SENT --> NORMAL
//!                                      \--fail--> FAILED (session cleared)
//! ```
//!
//! A request is eligible when it is not aimed at a login/refresh endpoint
//! and has not been replayed yet. Every request is replayed at most once.
//! Transport failures are never retried.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::LogoutReason;
use crate::http::envelope::{envelope_message, parse_body};
use crate::http::{Dispatcher, PendingRequest, RawResponse};

use super::session::SessionLifecycle;

/// Where a request is in the refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Normal,
    Refreshing,
    RetrySent,
    Failed,
}

/// What to do with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// Hand the response to the caller as-is
    Deliver,
    /// Refresh the access token, then replay the request once
    RefreshAndRetry,
    /// The replay was rejected too; end the session
    ExpireSession,
}

/// Decides how to handle a response with `status` to `request`
pub fn next_action(status: u16, request: &PendingRequest, config: &ClientConfig) -> NextAction {
    if status != 401 || config.is_exempt_path(&request.path) {
        NextAction::Deliver
    } else if request.is_retried() {
        NextAction::ExpireSession
    } else {
        NextAction::RefreshAndRetry
    }
}

/// Runs requests through the refresh-and-retry cycle
pub struct AuthInterceptor {
    dispatcher: Arc<Dispatcher>,
    session: Arc<SessionLifecycle>,
    config: Arc<ClientConfig>,
}

impl AuthInterceptor {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        session: Arc<SessionLifecycle>,
        config: Arc<ClientConfig>,
    ) -> Self {
        Self {
            dispatcher,
            session,
            config,
        }
    }

    pub fn session(&self) -> &Arc<SessionLifecycle> {
        &self.session
    }

    /// Sends `request`, refreshing and replaying it once on an eligible 401
    ///
    /// Returns the final response, whatever its status. A failed refresh or
    /// a rejected replay comes back as [`ClientError::AuthFailed`].
    pub async fn execute(&self, mut request: PendingRequest) -> Result<RawResponse, ClientError> {
        let mut state = AuthState::Normal;

        loop {
            let response = self.dispatcher.dispatch(&mut request).await?;

            match next_action(response.status, &request, &self.config) {
                NextAction::Deliver => {
                    if state == AuthState::RetrySent {
                        tracing::debug!(
                            "Replayed {} {} -> {}",
                            request.method,
                            request.path,
                            response.status
                        );
                    }
                    return Ok(response);
                }
                NextAction::ExpireSession => {
                    tracing::warn!(
                        "{} {} still unauthorized after refresh",
                        request.method,
                        request.path
                    );
                    let message = parse_body(&response.body)
                        .ok()
                        .and_then(|body| envelope_message(&body))
                        .unwrap_or_else(|| "Unauthorized after token refresh".to_string());
                    return Err(self.session.fail(LogoutReason::RetryRejected, &message));
                }
                NextAction::RefreshAndRetry => {
                    // Claim the single replay before refreshing
                    if !request.mark_retried() {
                        tracing::warn!(
                            "{} {} was already replayed; returning its response",
                            request.method,
                            request.path
                        );
                        return Ok(response);
                    }

                    state = AuthState::Refreshing;
                    tracing::info!(
                        "{} {} returned 401; refreshing access token",
                        request.method,
                        request.path
                    );

                    let sent_token = request.bearer().map(str::to_string);
                    if let Err(e) = self.session.refresh_for(sent_token.as_deref()).await {
                        state = AuthState::Failed;
                        tracing::warn!("Auth state {:?}: {}", state, e);
                        return Err(e);
                    }

                    state = AuthState::RetrySent;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{NavigationIntent, UserInfo};
    use crate::config::RefreshCoordination;
    use crate::error::TransportError;
    use crate::events::ClientEvent;
    use crate::http::transport::MockTransport;
    use crate::http::Method;
    use crate::testing::interceptor_with as interceptor;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn signed_in(interceptor: &AuthInterceptor, token: &str, refresh: Option<&str>) {
        interceptor
            .session()
            .tokens()
            .set(token, Some(&UserInfo::new("admin")), refresh)
            .unwrap();
    }

    #[test]
    fn test_next_action() {
        let config = ClientConfig::default();
        let mut request = PendingRequest::new(Method::Get, "/admin/stats");

        assert_eq!(next_action(200, &request, &config), NextAction::Deliver);
        assert_eq!(next_action(403, &request, &config), NextAction::Deliver);
        assert_eq!(next_action(401, &request, &config), NextAction::RefreshAndRetry);

        request.mark_retried();
        assert_eq!(next_action(401, &request, &config), NextAction::ExpireSession);

        let login = PendingRequest::new(Method::Post, "/admin/auth/login");
        assert_eq!(next_action(401, &login, &config), NextAction::Deliver);
        let refresh = PendingRequest::new(Method::Post, "/auth/refresh");
        assert_eq!(next_action(401, &refresh, &config), NextAction::Deliver);
        let register = PendingRequest::new(Method::Post, "/auth/register");
        assert_eq!(next_action(401, &register, &config), NextAction::Deliver);
    }

    #[tokio::test]
    async fn test_refresh_then_replay_with_new_token() {
        let mut transport = MockTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_send()
            .withf(|req| req.path == "/admin/stats" && req.bearer() == Some("T1"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(RawResponse::new(401, "")));
        transport
            .expect_send()
            .withf(|req| req.path == "/auth/refresh")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"success": true, "data": {"access_token": "T2"}}),
                ))
            });
        transport
            .expect_send()
            .withf(|req| req.path == "/admin/stats" && req.bearer() == Some("T2") && req.is_retried())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(RawResponse::json(200, &json!({"success": true, "data": {"n": 1}}))));

        let interceptor = interceptor(transport, ClientConfig::default());
        signed_in(&interceptor, "T1", Some("R1"));

        let response = interceptor
            .execute(PendingRequest::new(Method::Get, "/admin/stats"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(interceptor.session().tokens().access_token(), Some("T2".into()));
    }

    #[tokio::test]
    async fn test_replay_rejected_is_not_retried_again() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "/admin/stats")
            .times(2)
            .returning(|_| Ok(RawResponse::new(401, "")));
        transport
            .expect_send()
            .withf(|req| req.path == "/auth/refresh")
            .times(1)
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"success": true, "data": {"access_token": "T2"}}),
                ))
            });

        let interceptor = interceptor(transport, ClientConfig::default());
        signed_in(&interceptor, "T1", Some("R1"));

        let err = interceptor
            .execute(PendingRequest::new(Method::Get, "/admin/stats"))
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());
        assert!(!interceptor.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_exempt_401_returned_without_refresh() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "/admin/auth/login")
            .times(1)
            .returning(|_| Ok(RawResponse::json(401, &json!({"message": "bad password"}))));

        let interceptor = interceptor(transport, ClientConfig::default());
        signed_in(&interceptor, "T1", Some("R1"));

        let response = interceptor
            .execute(PendingRequest::new(Method::Post, "/admin/auth/login"))
            .await
            .unwrap();
        assert_eq!(response.status, 401);
        // No side effects on the stored session
        assert!(interceptor.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_no_refresh_token_fails_without_refresh_call() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "/admin/stats")
            .times(1)
            .returning(|_| Ok(RawResponse::new(401, "")));

        let interceptor = interceptor(transport, ClientConfig::default());
        signed_in(&interceptor, "T1", None);
        interceptor.session().set_current_route("/admin/dashboard");

        let err = interceptor
            .execute(PendingRequest::new(Method::Get, "/admin/stats"))
            .await
            .unwrap_err();
        assert_eq!(err.navigation(), Some(&NavigationIntent::to("/admin/login")));
        assert_eq!(interceptor.session().tokens().access_token(), None);
    }

    #[tokio::test]
    async fn test_transport_error_not_retried() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(TransportError::Timeout));

        let interceptor = interceptor(transport, ClientConfig::default());
        signed_in(&interceptor, "T1", Some("R1"));

        let err = interceptor
            .execute(PendingRequest::new(Method::Get, "/admin/stats"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(TransportError::Timeout)));
        assert!(interceptor.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_single_flight_reuses_rotated_token() {
        let mut transport = MockTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_send()
            .withf(|req| req.bearer() == Some("T1"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(RawResponse::new(401, "")));
        transport
            .expect_send()
            .withf(|req| req.bearer() == Some("T2") && req.is_retried())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(RawResponse::new(200, "")));

        let config = ClientConfig {
            refresh_coordination: RefreshCoordination::SingleFlight,
            ..Default::default()
        };
        let interceptor = interceptor(transport, config);
        signed_in(&interceptor, "T1", Some("R1"));

        // Another caller rotates the token right after the 401 is logged
        let tokens = interceptor.session().tokens().clone();
        let rotated = AtomicBool::new(false);
        interceptor.dispatcher.events().subscribe(move |event| {
            if let ClientEvent::RequestLogged(entry) = event {
                if entry.status == 401 && !rotated.swap(true, Ordering::SeqCst) {
                    tokens.set("T2", None, Some("R2")).unwrap();
                }
            }
        });

        let request = PendingRequest::new(Method::Get, "/admin/stats");
        let response = interceptor.execute(request).await.unwrap();
        assert_eq!(response.status, 200);
    }
}
