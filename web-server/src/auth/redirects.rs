// web-server/src/auth/redirects.rs
use url::Url;

/// Destination used when a sign-in flow carries no usable redirect target.
pub const DEFAULT_SIGN_IN_REDIRECT: &str = "/onboarding";

/// A single leading slash and nothing more. `//host/path` is a
/// protocol-relative URL, not a path, and must never be treated as safe.
fn is_safe_relative_path(value: &str) -> bool {
    value.starts_with('/') && !value.starts_with("//")
}

/// Resolve a possibly attacker-controlled post-login redirect target into a
/// same-origin path.
///
/// The output always starts with exactly one `/`. Anything that cannot be
/// proven same-origin (cross-origin absolute URLs, protocol-relative URLs,
/// unparseable input) falls back silently; this is a UX convenience, not a
/// last-resort boundary, so it never errors.
///
/// `origin` is the gateway's own external origin. When it is unknown
/// (`None`), only safe relative paths are accepted.
pub fn resolve_sign_in_redirect(
    raw_redirect: Option<&str>,
    fallback_override: Option<&str>,
    origin: Option<&Url>,
) -> String {
    let fallback = fallback_override.unwrap_or(DEFAULT_SIGN_IN_REDIRECT);

    let raw = match raw_redirect {
        Some(r) if !r.is_empty() => r,
        _ => return fallback.to_string(),
    };

    if is_safe_relative_path(raw) {
        return raw.to_string();
    }

    let origin = match origin {
        Some(o) => o,
        None => return fallback.to_string(),
    };

    match origin.join(raw) {
        Ok(parsed) => {
            if parsed.origin() != origin.origin() {
                return fallback.to_string();
            }
            let mut resolved = parsed.path().to_string();
            if let Some(query) = parsed.query() {
                resolved.push('?');
                resolved.push_str(query);
            }
            if let Some(fragment) = parsed.fragment() {
                resolved.push('#');
                resolved.push_str(fragment);
            }
            // A same-origin URL can still carry a protocol-relative-looking
            // path (`http://host//evil/x`); re-check before handing it out.
            if !is_safe_relative_path(&resolved) {
                return fallback.to_string();
            }
            resolved
        }
        Err(_) => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn test_missing_redirect_uses_fallback_override() {
        assert_eq!(
            resolve_sign_in_redirect(None, Some("/boards"), Some(&origin())),
            "/boards"
        );
    }

    #[test]
    fn test_missing_redirect_defaults_to_onboarding() {
        assert_eq!(
            resolve_sign_in_redirect(None, None, Some(&origin())),
            "/onboarding"
        );
        assert_eq!(
            resolve_sign_in_redirect(Some(""), None, Some(&origin())),
            "/onboarding"
        );
    }

    #[test]
    fn test_safe_relative_path_passes_through_verbatim() {
        assert_eq!(
            resolve_sign_in_redirect(Some("/dashboard?tab=ops#queue"), None, Some(&origin())),
            "/dashboard?tab=ops#queue"
        );
    }

    #[test]
    fn test_protocol_relative_url_is_rejected() {
        assert_eq!(
            resolve_sign_in_redirect(
                Some("//evil.example.com/path"),
                Some("/activity"),
                Some(&origin())
            ),
            "/activity"
        );
    }

    #[test]
    fn test_cross_origin_absolute_url_is_rejected() {
        assert_eq!(
            resolve_sign_in_redirect(
                Some("https://evil.example.com/steal"),
                Some("/activity"),
                Some(&origin())
            ),
            "/activity"
        );
    }

    #[test]
    fn test_same_origin_absolute_url_is_normalized_to_path() {
        assert_eq!(
            resolve_sign_in_redirect(
                Some("http://localhost:3000/boards/new?src=invite#top"),
                None,
                Some(&origin())
            ),
            "/boards/new?src=invite#top"
        );
    }

    #[test]
    fn test_same_origin_url_with_double_slash_path_is_rejected() {
        assert_eq!(
            resolve_sign_in_redirect(
                Some("http://localhost:3000//evil.example.com/x"),
                Some("/activity"),
                Some(&origin())
            ),
            "/activity"
        );
    }

    #[test]
    fn test_unknown_origin_rejects_absolute_urls() {
        assert_eq!(
            resolve_sign_in_redirect(Some("http://localhost:3000/boards"), None, None),
            "/onboarding"
        );
    }

    #[test]
    fn test_output_is_always_a_single_slash_path() {
        let nasty = [
            "javascript:alert(1)",
            "https://evil.example.com",
            "//evil.example.com",
            "\\\\evil.example.com",
            "boards",
            "http://localhost:3000",
            "http://localhost:3000//evil.example.com/x",
            "data:text/html,hello",
            "   ",
        ];
        for input in nasty {
            let resolved = resolve_sign_in_redirect(Some(input), None, Some(&origin()));
            assert!(resolved.starts_with('/'), "input {input:?} gave {resolved:?}");
            assert!(!resolved.starts_with("//"), "input {input:?} gave {resolved:?}");
        }
    }
}
