//! Space-separated scope strings.

/// Canonical form of a requested scope: tokens separated by single spaces,
/// duplicates dropped, falling back to `default` when nothing is left.
#[must_use]
pub fn normalize(requested: Option<&str>, default: &str) -> String {
    let mut tokens: Vec<&str> = Vec::new();
    for token in requested.unwrap_or_default().split_whitespace() {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    if tokens.is_empty() { default.to_string() } else { tokens.join(" ") }
}

/// Split a stored scope into its tokens.
#[must_use]
pub fn split(scope: &str) -> Vec<String> {
    scope.split(' ').filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// First token of `requested` not in `supported`, if any.
#[must_use]
pub fn first_unsupported<'a>(requested: &'a str, supported: &[&str]) -> Option<&'a str> {
    requested.split_whitespace().find(|token| !supported.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults() {
        assert_eq!(normalize(None, "read"), "read");
        assert_eq!(normalize(Some(""), "read"), "read");
        assert_eq!(normalize(Some("   "), "read"), "read");
    }

    #[test]
    fn test_normalize_collapses() {
        assert_eq!(normalize(Some(" read   write read "), "read"), "read write");
    }

    #[test]
    fn test_split() {
        assert_eq!(split("read write"), vec!["read".to_string(), "write".to_string()]);
    }

    #[test]
    fn test_first_unsupported() {
        assert_eq!(first_unsupported("read write", &["read", "write"]), None);
        assert_eq!(first_unsupported("read admin", &["read", "write"]), Some("admin"));
    }
}
