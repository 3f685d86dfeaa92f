//! Bearer credential extraction from request headers.
//!
//! Precedence (first match wins):
//! 1. `Authorization: Bearer <token>` (case-sensitive scheme, single space)
//! 2. `Cookie: jwt=<token>`
//!
//! Nothing here validates the token.

use std::fmt;

use axum::http::{HeaderMap, header};

pub const BEARER_PREFIX: &str = "Bearer ";
pub const TOKEN_COOKIE_NAME: &str = "jwt";

/// Where the credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    AuthorizationHeader,
    Cookie,
}

/// A candidate credential borrowed from the request. Lives for one admission decision.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BearerToken<'a> {
    value: &'a str,
    source: TokenSource,
}

impl<'a> BearerToken<'a> {
    pub fn as_str(&self) -> &'a str {
        self.value
    }

    pub fn source(&self) -> TokenSource {
        self.source
    }
}

impl fmt::Debug for BearerToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the credential itself
        f.debug_struct("BearerToken")
            .field("source", &self.source)
            .field("len", &self.value.len())
            .finish()
    }
}

pub fn extract(headers: &HeaderMap) -> Option<BearerToken<'_>> {
    from_authorization(headers)
        .map(|value| BearerToken {
            value,
            source: TokenSource::AuthorizationHeader,
        })
        .or_else(|| {
            from_cookie(headers, TOKEN_COOKIE_NAME).map(|value| BearerToken {
                value,
                source: TokenSource::Cookie,
            })
        })
}

fn from_authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
}

/// First value of the named cookie across all `Cookie` headers.
pub fn from_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| {
            let v = v.trim();
            v.strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(v)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer X"),
            (header::COOKIE, "jwt=Y"),
        ]);

        let token = extract(&h).unwrap();
        assert_eq!(token.as_str(), "X");
        assert_eq!(token.source(), TokenSource::AuthorizationHeader);
    }

    #[test]
    fn wrong_scheme_without_cookie_yields_nothing() {
        let h = headers(&[(header::AUTHORIZATION, "Basic abc")]);
        assert!(extract(&h).is_none());
    }

    #[test]
    fn wrong_scheme_falls_back_to_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Basic abc"),
            (header::COOKIE, "theme=dark; jwt=from-cookie"),
        ]);

        let token = extract(&h).unwrap();
        assert_eq!(token.as_str(), "from-cookie");
        assert_eq!(token.source(), TokenSource::Cookie);
    }

    #[test]
    fn bearer_prefix_is_case_sensitive() {
        let h = headers(&[(header::AUTHORIZATION, "bearer abc")]);
        assert!(extract(&h).is_none());

        let h = headers(&[(header::AUTHORIZATION, "Bearer  abc")]);
        assert_eq!(extract(&h).unwrap().as_str(), " abc");
    }

    #[test]
    fn cookie_lookup_spans_multiple_headers() {
        let h = headers(&[
            (header::COOKIE, "session=1"),
            (header::COOKIE, "jwtx=no; jwt=\"quoted\""),
        ]);

        assert_eq!(extract(&h).unwrap().as_str(), "quoted");
    }

    #[test]
    fn cookie_name_must_match_exactly() {
        let h = headers(&[(header::COOKIE, "JWT=a; my_jwt=b")]);
        assert!(extract(&h).is_none());
    }

    #[test]
    fn no_credentials_at_all() {
        assert!(extract(&HeaderMap::new()).is_none());
    }

    #[test]
    fn debug_output_does_not_leak_the_token() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer super-secret")]);
        let printed = format!("{:?}", extract(&h).unwrap());
        assert!(!printed.contains("super-secret"));
    }
}
