//! Authentication - credential storage, session lifecycle and the
//! refresh-and-retry interceptor

mod interceptor;
mod session;
mod token_store;

pub use interceptor::{next_action, AuthInterceptor, AuthState, NextAction};
pub use session::{LogoutOutcome, NavigationIntent, SessionLifecycle};
pub use token_store::{Credentials, TokenStore, UserInfo};
