//! CSRF token discovery.
//!
//! Mutating requests require the `csrftoken` cookie value in an
//! `X-CSRFToken` header. The token can be supplied directly or parsed out of
//! a raw Cookie header string.

const COOKIE_NAME: &str = "csrftoken";

/// A non-empty CSRF token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Wrap a token, rejecting empty or whitespace-only values.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Parse the `csrftoken` cookie out of a Cookie header string,
    /// percent-decoding the value.
    pub fn from_cookie_header(header: &str) -> Option<Self> {
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == COOKIE_NAME)
            .and_then(|(_, value)| {
                let decoded = urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string());
                Self::new(decoded)
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_tokens() {
        assert!(CsrfToken::new("").is_none());
        assert!(CsrfToken::new("   ").is_none());
        assert!(CsrfToken::new("abc").is_some());
    }

    #[test]
    fn parses_cookie_among_others() {
        let header = "sessionid=xyz; csrftoken=abc123; theme=dark";
        let token = CsrfToken::from_cookie_header(header).unwrap();
        assert_eq!(token.as_str(), "abc123");
    }

    #[test]
    fn percent_decodes_value() {
        let token = CsrfToken::from_cookie_header("csrftoken=a%2Bb").unwrap();
        assert_eq!(token.as_str(), "a+b");
    }

    #[test]
    fn absent_or_empty_cookie_yields_none() {
        assert!(CsrfToken::from_cookie_header("sessionid=xyz").is_none());
        assert!(CsrfToken::from_cookie_header("csrftoken=").is_none());
        assert!(CsrfToken::from_cookie_header("").is_none());
    }
}
