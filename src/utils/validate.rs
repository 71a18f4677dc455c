use chrono::Datelike;
use regex::Regex;
use std::sync::LazyLock;
use validator::ValidationError;

/// URL-safe identifier for categories and genres.
pub static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

pub static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

/// "me" is reserved as the self-profile path segment.
pub fn validate_username_not_me(value: &str) -> Result<(), ValidationError> {
    if value == "me" {
        return Err(ValidationError::new("reserved_username")
            .with_message("Username 'me' is reserved".into()));
    }
    Ok(())
}

/// Titles cannot be dated in the future.
pub fn validate_year_not_future(value: i32) -> Result<(), ValidationError> {
    let current_year = chrono::Utc::now().year();
    if value > current_year {
        return Err(ValidationError::new("future_year")
            .with_message("Title year cannot be in the future".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn slug_pattern_accepts_url_safe() {
        for slug in ["films", "sci-fi", "top_10", "A-1_b"] {
            assert!(SLUG_RE.is_match(slug), "{slug} should match");
        }
    }

    #[test]
    fn slug_pattern_rejects_others() {
        for slug in ["", "with space", "кино", "semi;colon", "dot.dot"] {
            assert!(!SLUG_RE.is_match(slug), "{slug} should not match");
        }
    }

    #[test]
    fn username_pattern() {
        for name in ["alice", "a.b@c+d-e", "under_score"] {
            assert!(USERNAME_RE.is_match(name), "{name} should match");
        }
        for name in ["", "with space", "semi;colon"] {
            assert!(!USERNAME_RE.is_match(name), "{name} should not match");
        }
    }

    #[test]
    fn me_is_reserved() {
        assert!(validate_username_not_me("me").is_err());
        assert!(validate_username_not_me("meat").is_ok());
        assert!(validate_username_not_me("Me").is_ok());
    }

    #[test]
    fn current_year_is_allowed() {
        let year = chrono::Utc::now().year();
        assert!(validate_year_not_future(year).is_ok());
        assert!(validate_year_not_future(year - 30).is_ok());
    }

    #[test]
    fn future_year_is_rejected() {
        let year = chrono::Utc::now().year();
        assert!(validate_year_not_future(year + 1).is_err());
    }
}
