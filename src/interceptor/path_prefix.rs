use super::{Interceptor, SendFn};
use crate::Request;
use std::sync::Arc;

/// Rewrites every relative request path to sit under a prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixInterceptor {
    prefix: Arc<str>,
}

impl PathPrefixInterceptor {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Arc::from(prefix.into()),
        }
    }
}

impl Interceptor for PathPrefixInterceptor {
    fn name(&self) -> &'static str {
        "path-prefix"
    }

    fn wrap(&self, next: SendFn) -> SendFn {
        let prefix = self.prefix.clone();
        Arc::new(move |mut request: Request| {
            request.path = prefixed(&prefix, &request.path);
            next(request)
        })
    }
}

/// Joins `prefix` and `path`.
///
/// Fully-qualified paths (`scheme://…`) are returned unchanged. A `/` is
/// inserted only when the prefix does not end with one and the path does not
/// start with one; an empty path yields the prefix.
///
/// ```
/// use rest_chain::interceptor::prefixed;
///
/// assert_eq!(prefixed("http://localhost:8000", "log"), "http://localhost:8000/log");
/// assert_eq!(prefixed("http://localhost:8000", "/log"), "http://localhost:8000/log");
/// assert_eq!(prefixed("http://localhost:8000", "http://other/log"), "http://other/log");
/// ```
pub fn prefixed(prefix: &str, path: &str) -> String {
    if prefix.is_empty() || is_fully_qualified(path) {
        return path.to_string();
    }

    let mut joined = prefix.to_string();
    if !path.is_empty() {
        if !prefix.ends_with('/') && !path.starts_with('/') {
            joined.push('/');
        }
        joined.push_str(path);
    }
    joined
}

fn is_fully_qualified(path: &str) -> bool {
    let Some((scheme, _)) = path.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_insertion() {
        assert_eq!(prefixed("http://h:1", "XXX"), "http://h:1/XXX");
        assert_eq!(prefixed("http://h:1/", "XXX"), "http://h:1/XXX");
        assert_eq!(prefixed("http://h:1/api", "/log"), "http://h:1/api/log");
        assert_eq!(prefixed("http://h:1", ""), "http://h:1");
    }

    #[test]
    fn test_fully_qualified_untouched() {
        assert_eq!(prefixed("http://h:1", "https://x/y"), "https://x/y");
        assert_eq!(prefixed("http://h:1", "svn+ssh://x/y"), "svn+ssh://x/y");
        // Not a scheme: contains a slash before "://"
        assert_eq!(prefixed("http://h:1", "/a/b://c"), "http://h:1/a/b://c");
    }

    #[test]
    fn test_empty_prefix_is_identity() {
        assert_eq!(prefixed("", "log"), "log");
    }
}
