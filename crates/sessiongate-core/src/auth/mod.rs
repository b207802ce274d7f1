//! Authentication module for the client-side session.
//!
//! This module provides:
//! - `Session`: the bearer token obtained from a credential exchange
//! - `Credentials`: transient email/password pair, never persisted
//! - `TokenStore`: the single persisted token slot, backed by a file,
//!   the OS keychain, or memory
//!
//! A client is authenticated exactly when the token slot holds a value.

pub mod credentials;
pub mod session;
pub mod token_store;

pub use credentials::Credentials;
pub use session::Session;
pub use token_store::{FileStorage, KeyringStorage, MemoryStorage, TokenStorage, TokenStore, TOKEN_KEY};
