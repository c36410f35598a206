//! services/api/src/web/session.rs
//!
//! Anonymous per-browser session middleware. Every request is guaranteed a
//! session identifier before any handler runs; the identifier only lives in
//! the client's cookie and in the rows it keys.

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Name of the long-lived session cookie.
pub const SESSION_COOKIE: &str = "elice_session";

/// One year, in seconds.
const SESSION_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;

/// The session identity resolved for one request. `minted` is true when the
/// request carried no cookie and a fresh identifier was generated.
#[derive(Clone, Debug)]
pub struct SessionIdentity {
    pub id: String,
    pub minted: bool,
}

/// Middleware that resolves the session identity and exposes it to handlers
/// through request extensions.
///
/// A freshly minted identifier is sent back as a 1-year `HttpOnly` cookie.
/// This never fails; a client that drops the cookie silently becomes a new,
/// disconnected session with no merge or recovery path.
pub async fn ensure_session(mut req: Request, next: Next) -> Response {
    let existing = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_cookie_value);

    let identity = match existing {
        Some(id) => SessionIdentity { id, minted: false },
        None => SessionIdentity {
            id: mint_session_id(),
            minted: true,
        },
    };
    req.extensions_mut().insert(identity.clone());

    let mut response = next.run(req).await;

    if identity.minted {
        // Not marked Secure: plaintext transport is acceptable for this
        // deployment.
        let cookie = format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, identity.id, SESSION_MAX_AGE_SECS
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    // Attach the resolved id for downstream usage.
    if let Ok(value) = HeaderValue::from_str(&identity.id) {
        response.headers_mut().insert("x-user-id", value);
    }

    response
}

/// Extracts the session cookie value from a `Cookie` header, treating an
/// empty value as absent.
fn session_cookie_value(header: &str) -> Option<String> {
    header.split(';').find_map(|part| {
        let value = part.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('=')?;
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

/// Mints a new opaque identifier: the first 16 hex characters of a v4 UUID.
fn mint_session_id() -> String {
    Uuid::new_v4().simple().to_string()[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_are_16_hex_chars() {
        let id = mint_session_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn cookie_value_is_found_among_other_cookies() {
        let header = "theme=dark; elice_session=abcdef0123456789; lang=en";
        assert_eq!(
            session_cookie_value(header),
            Some("abcdef0123456789".to_string())
        );
    }

    #[test]
    fn missing_or_empty_cookie_yields_none() {
        assert_eq!(session_cookie_value("theme=dark"), None);
        assert_eq!(session_cookie_value("elice_session="), None);
        assert_eq!(session_cookie_value("elice_session_old=abc"), None);
    }
}
