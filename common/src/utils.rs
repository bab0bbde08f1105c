// common/src/utils.rs
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Setup tracing for consistent logging across the gateway
pub fn setup_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Format check for hosted-provider publishable keys: `pk_test_...` or
/// `pk_live_...` followed by at least one alphanumeric character.
///
/// Secretless builds (CI) run without a real key; a failing check disables
/// hosted auth instead of crashing at startup.
pub fn is_likely_valid_publishable_key(key: &str) -> bool {
    let rest = key
        .strip_prefix("pk_test_")
        .or_else(|| key.strip_prefix("pk_live_"));

    match rest {
        Some(suffix) => !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_alphanumeric()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_publishable_keys() {
        assert!(is_likely_valid_publishable_key("pk_test_abc123DEF"));
        assert!(is_likely_valid_publishable_key("pk_live_Zz9"));
    }

    #[test]
    fn test_invalid_publishable_keys() {
        assert!(!is_likely_valid_publishable_key(""));
        assert!(!is_likely_valid_publishable_key("pk_test_"));
        assert!(!is_likely_valid_publishable_key("pk_prod_abc123"));
        assert!(!is_likely_valid_publishable_key("sk_test_abc123"));
        assert!(!is_likely_valid_publishable_key("pk_test_abc-123"));
        assert!(!is_likely_valid_publishable_key("pk_live_abc 123"));
    }
}
