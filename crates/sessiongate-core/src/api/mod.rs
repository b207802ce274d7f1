//! REST API client module for the authentication backend.
//!
//! This module provides the `ApiClient` for the backend's login, signup,
//! page data and OAuth helper endpoints, and the `Backend` trait the auth
//! gateway and pages are written against.
//!
//! Protected endpoints take a JWT bearer token obtained from `POST /login`
//! or from an OAuth round trip.

pub mod client;
pub mod error;

pub use client::{ApiClient, Backend};
pub use error::ApiError;
