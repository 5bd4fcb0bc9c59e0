//! Page access evaluation.
//!
//! Pages carry an `access_level` string interpreted only here. Recognized
//! levels:
//!
//! - `public` — always allowed
//! - `member` / `registered` — authenticated session required
//! - `premium` / `subscriber` — session with the premium capability, with
//!   the access-override hooks getting the final word
//!
//! An unrecognized level allows access. Locking every typo'd level would
//! turn content mistakes into outages; the tradeoff is documented in the
//! project design notes.

use axum::http::HeaderMap;

use trellis_provider::Viewer;

use crate::hooks::{AccessContext, Hooks};

/// Authenticated state of the current request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    /// Whether the request carries an authenticated identity.
    pub authenticated: bool,
    /// Whether the identity holds the premium capability.
    pub premium: bool,
    /// Stable user identifier.
    pub user_id: Option<String>,
}

impl Session {
    /// Build a session from trusted upstream headers.
    ///
    /// The engine sits behind an authenticating proxy that injects
    /// `x-auth-user` and `x-auth-tier`. Absent headers mean an anonymous
    /// request.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_id = headers
            .get("x-auth-user")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        // The tier header only means something for an identified user
        let premium = user_id.is_some()
            && headers
                .get("x-auth-tier")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|tier| tier.eq_ignore_ascii_case("premium"));

        Self {
            authenticated: user_id.is_some(),
            premium,
            user_id,
        }
    }

    /// Project this session into the provider-facing viewer shape.
    #[must_use]
    pub fn viewer(&self) -> Viewer {
        Viewer {
            authenticated: self.authenticated,
            premium: self.premium,
            user_id: self.user_id.clone(),
        }
    }
}

/// Outcome of an access evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny {
        reason: String,
        required_tier: String,
    },
}

impl AccessDecision {
    fn deny(reason: &str, tier: &str) -> Self {
        Self::Deny {
            reason: reason.to_owned(),
            required_tier: tier.to_owned(),
        }
    }
}

/// Evaluate whether a session may view a page with the given access level.
///
/// Override hooks run only when the built-in evaluation would deny; they may
/// grant access but never revoke it.
#[must_use]
pub fn evaluate_access(
    access_level: &str,
    session: &Session,
    hooks: &Hooks,
    route: &str,
) -> AccessDecision {
    let denied = match access_level {
        "public" => return AccessDecision::Allow,
        "member" | "registered" => {
            if session.authenticated {
                return AccessDecision::Allow;
            }
            AccessDecision::deny("sign in to view this page", access_level)
        }
        "premium" | "subscriber" => {
            // The capability counts only on an authenticated session
            if session.authenticated && session.premium {
                return AccessDecision::Allow;
            }
            AccessDecision::deny("a premium subscription is required", access_level)
        }
        other => {
            // Unknown levels fail open
            tracing::debug!(level = %other, route = %route, "Unrecognized access level, allowing");
            return AccessDecision::Allow;
        }
    };

    let context = AccessContext {
        route: route.to_owned(),
        access_level: access_level.to_owned(),
        session: session.clone(),
    };
    if hooks.access_granted(&context) {
        return AccessDecision::Allow;
    }

    denied
}
