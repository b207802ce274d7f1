//! Core library for sessiongate.
//!
//! A client for an email/password + OAuth authentication backend:
//!
//! - `auth`: the persisted bearer-token slot (`TokenStore`) and session types
//! - `api`: HTTP client for the backend (`ApiClient`, `Backend`)
//! - `oauth`: identity provider client and redirect extractors
//! - `gateway`: credential exchange producing sessions (`AuthGateway`)
//! - `session`: per-page state machine and the pages built on it
//! - `config`: file and environment configuration
//!
//! Front ends render `session::PageState` and act on navigation events;
//! they never read the token store directly.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod oauth;
pub mod session;

pub use api::{ApiClient, ApiError, Backend};
pub use auth::{Credentials, Session, TokenStore};
pub use config::Config;
pub use error::AuthError;
pub use gateway::{AuthGateway, SignupOutcome};
pub use oauth::{GoTrueProvider, IdentityProvider, OAuthProvider};
pub use session::{
    CallbackPage, ChannelNavigator, HomePage, LoginPage, NavigationEvent, Navigator, PageState,
    PageStatus, Route, ServicePage, SessionContext, SessionController, SignupPage,
};
