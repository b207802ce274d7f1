//! Data models for the backend's JSON payloads.
//!
//! Page payloads (`HomeData`, `ServiceData`) can be exported as TypeScript
//! bindings with the `ts` feature.

pub mod auth;
pub mod page;

pub use auth::{GoogleLoginUrl, HealthStatus, TokenResponse, VerifiedUser, VerifyResponse};
pub use page::{HomeData, ServiceData};
