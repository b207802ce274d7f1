//! Reading the result of an OAuth round trip out of a redirect.
//!
//! Different flows surface their result in different places, so the gateway
//! tries each extractor in `EXTRACTORS` order and acts on the first grant.
//! The provider session is only looked up once the redirect URL itself
//! yields nothing.

use url::Url;

use super::provider::ProviderSession;

/// What a redirect carried back from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuthGrant {
    /// `?code=` from the authorization-code flow; must be exchanged.
    AuthorizationCode(String),
    /// `#access_token=` from the implicit flow; usable as is.
    ImplicitToken(String),
    /// The provider client already holds a session.
    ExistingSession(ProviderSession),
}

/// Everything an extractor may look at.
pub struct RedirectContext<'a> {
    pub url: &'a Url,
    pub existing_session: Option<&'a ProviderSession>,
}

pub type Extractor = fn(&RedirectContext<'_>) -> Option<OAuthGrant>;

/// Extraction order: authorization code, then implicit token, then an
/// already-active provider session.
pub const EXTRACTORS: [Extractor; 3] = [authorization_code, implicit_token, existing_session];

pub fn authorization_code(ctx: &RedirectContext<'_>) -> Option<OAuthGrant> {
    ctx.url
        .query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
        .map(OAuthGrant::AuthorizationCode)
}

pub fn implicit_token(ctx: &RedirectContext<'_>) -> Option<OAuthGrant> {
    let fragment = ctx.url.fragment()?;
    url::form_urlencoded::parse(fragment.as_bytes())
        .find(|(key, _)| key == "access_token")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
        .map(OAuthGrant::ImplicitToken)
}

pub fn existing_session(ctx: &RedirectContext<'_>) -> Option<OAuthGrant> {
    ctx.existing_session
        .filter(|session| !session.access_token.is_empty())
        .cloned()
        .map(OAuthGrant::ExistingSession)
}

/// Every grant the redirect offers, in priority order.
pub fn grants<'a>(ctx: &'a RedirectContext<'a>) -> impl Iterator<Item = OAuthGrant> + 'a {
    EXTRACTORS.into_iter().filter_map(move |extract| extract(ctx))
}
