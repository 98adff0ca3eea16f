use lambda_http::http::header::{AUTHORIZATION, COOKIE};
use lambda_http::http::HeaderMap;
use thiserror::Error;

pub const TOKEN_COOKIE: &str = "jwt";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No API tokens configured")]
    NotConfigured,

    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid token")]
    InvalidToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    BearerHeader,
    Cookie,
}

/// Who got through the guard and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub source: CredentialSource,
}

/// Gate in front of the write routes.
pub trait RouteGuard: Send + Sync {
    fn authorize(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError>;
}

/// Accepts `Authorization: Bearer <token>` or a `jwt` cookie carrying one of
/// the configured tokens.
#[derive(Debug, Clone, Default)]
pub struct BearerTokenGuard {
    tokens: Vec<String>,
}

impl BearerTokenGuard {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}

impl RouteGuard for BearerTokenGuard {
    fn authorize(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        if self.tokens.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        let (token, source) = if let Some(token) = bearer_token(headers) {
            (token, CredentialSource::BearerHeader)
        } else if let Some(token) = cookie_value(headers, TOKEN_COOKIE) {
            (token, CredentialSource::Cookie)
        } else {
            return Err(AuthError::MissingCredentials);
        };

        if self.tokens.iter().any(|t| t == token) {
            Ok(AuthContext { source })
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Value of cookie `name` across every `Cookie` header.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// `Access-Control-Allow-Origin` value for a request.
///
/// A wildcard entry yields the literal `*`. Otherwise the origin is echoed
/// only when listed, falling back to the first entry.
pub fn get_cors_origin(request_origin: Option<&str>, allowed: &[String]) -> String {
    if allows_any_origin(allowed) {
        return "*".to_string();
    }

    match request_origin {
        Some(origin) if allowed.iter().any(|o| o == origin) => origin.to_string(),
        _ => allowed.first().cloned().unwrap_or_else(|| "*".to_string()),
    }
}

/// Credentialed requests (the `jwt` cookie) are only advertised for an
/// explicit origin list.
pub fn allows_credentials(allowed: &[String]) -> bool {
    !allowed.is_empty() && !allows_any_origin(allowed)
}

fn allows_any_origin(allowed: &[String]) -> bool {
    allowed.iter().any(|o| o == "*")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::http::HeaderValue;

    fn guard() -> BearerTokenGuard {
        BearerTokenGuard::new(vec!["secret".to_string()])
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn accepts_bearer_header() {
        let ctx = guard().authorize(&headers(&[("authorization", "Bearer secret")])).unwrap();
        assert_eq!(ctx.source, CredentialSource::BearerHeader);
    }

    #[test]
    fn accepts_jwt_cookie() {
        let ctx = guard()
            .authorize(&headers(&[("cookie", "theme=dark; jwt=secret")]))
            .unwrap();
        assert_eq!(ctx.source, CredentialSource::Cookie);
    }

    #[test]
    fn rejects_missing_and_wrong_tokens() {
        assert_eq!(guard().authorize(&HeaderMap::new()), Err(AuthError::MissingCredentials));
        assert_eq!(
            guard().authorize(&headers(&[("authorization", "Bearer nope")])),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn no_tokens_configured_rejects_everything() {
        let guard = BearerTokenGuard::default();
        assert_eq!(
            guard.authorize(&headers(&[("authorization", "Bearer secret")])),
            Err(AuthError::NotConfigured)
        );
    }

    #[test]
    fn cors_origin_resolution() {
        let wildcard = vec!["*".to_string()];
        let listed = vec!["https://mila.test".to_string(), "https://admin.mila.test".to_string()];

        assert_eq!(get_cors_origin(Some("https://x.test"), &wildcard), "*");
        assert_eq!(get_cors_origin(None, &wildcard), "*");
        assert_eq!(get_cors_origin(Some("https://admin.mila.test"), &listed), "https://admin.mila.test");
        assert_eq!(get_cors_origin(Some("https://evil.test"), &listed), "https://mila.test");
    }

    #[test]
    fn credentials_need_an_explicit_origin_list() {
        assert!(!allows_credentials(&["*".to_string()]));
        assert!(!allows_credentials(&["https://mila.test".to_string(), "*".to_string()]));
        assert!(!allows_credentials(&[]));
        assert!(allows_credentials(&["https://mila.test".to_string()]));
    }
}
