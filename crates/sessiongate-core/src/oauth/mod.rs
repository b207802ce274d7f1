//! OAuth support: the identity provider seam and redirect parsing.
//!
//! The identity provider is an external collaborator. `IdentityProvider`
//! is the slice of its client surface the auth gateway needs, and
//! `GoTrueProvider` speaks it over HTTP for GoTrue-compatible servers
//! (Supabase Auth). Redirect URLs are read by the ordered extractors in
//! `extract`.

pub mod extract;
pub mod pkce;
pub mod provider;
pub mod gotrue;

pub use extract::{OAuthGrant, RedirectContext, EXTRACTORS};
pub use gotrue::GoTrueProvider;
pub use provider::{IdentityProvider, OAuthProvider, ProviderError, ProviderSession};
