//! Selector pattern matching.
//!
//! Users and domains follow different rules:
//!
//! - A pattern user must equal the identity user; an empty pattern user
//!   matches any identity user; a pattern without user only matches an
//!   identity without user.
//! - A `.`-led pattern domain matches as a byte suffix; the root `.` matches
//!   every domain; any other pattern domain must be equal.
//!
//! There is no case folding or Unicode normalization.

use crate::identity::{Identity, Pattern};
use crate::selector::ROOT_DOMAIN;

/// Decide whether `pattern` applies to `identity`.
///
/// A malformed identity (empty user or empty domain) or a pattern with an
/// empty domain never matches.
pub fn matches(identity: &Identity<'_>, pattern: &Pattern<'_>) -> bool {
    if !identity.is_well_formed() || pattern.validate_pattern().is_err() {
        return false;
    }
    user_matches(identity.user(), pattern.user())
        && domain_matches(identity.domain(), pattern.domain())
}

fn user_matches(user: Option<&[u8]>, pattern: Option<&[u8]>) -> bool {
    match (pattern, user) {
        (Some(_), None) => false,
        (Some(expected), Some(user)) => expected.is_empty() || expected == user,
        (None, user) => user.is_none(),
    }
}

fn domain_matches(domain: &[u8], pattern: &[u8]) -> bool {
    if pattern == ROOT_DOMAIN {
        return true;
    }
    if pattern.first() == Some(&b'.') {
        domain.ends_with(pattern)
    } else {
        domain == pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;
    use proptest::prelude::*;

    fn check(identity: &str, pattern: &str) -> bool {
        matches(
            &Identity::parse(identity.as_bytes()),
            &Pattern::parse(pattern.as_bytes()),
        )
    }

    #[test]
    fn test_exact_match() {
        assert!(check("alice@example.com", "alice@example.com"));
        assert!(check("example.com", "example.com"));
        assert!(!check("alice@example.com", "bob@example.com"));
        assert!(!check("alice@example.com", "alice@example.org"));
    }

    #[test]
    fn test_user_rules() {
        // Any user
        assert!(check("alice@example.com", "@example.com"));
        // Pattern requires a user
        assert!(!check("example.com", "@example.com"));
        assert!(!check("example.com", "alice@example.com"));
        // Pattern forbids a user
        assert!(!check("alice@example.com", "example.com"));
        // Length must agree, not just the prefix
        assert!(!check("alice@example.com", "alic@example.com"));
        assert!(!check("alic@example.com", "alice@example.com"));
    }

    #[test]
    fn test_suffix_domain() {
        assert!(check("mail.example.com", ".example.com"));
        assert!(check("a.b.example.com", ".example.com"));
        assert!(check("alice@mail.example.com", "@.example.com"));
        assert!(check("alice@mail.example.com", "alice@.example.com"));
        assert!(!check("example.com", ".example.com"));
        assert!(!check("mail.example.org", ".example.com"));
        assert!(!check("com", ".com"));
    }

    #[test]
    fn test_suffix_is_byte_suffix() {
        // Byte-exact suffix: no label boundary beyond the leading dot
        assert!(check("mail.badexample.com", ".com"));
        assert!(!check("mail.badexample.com", ".example.com"));
    }

    #[test]
    fn test_root_matches_every_domain() {
        assert!(check("example.com", "."));
        assert!(check("localhost", "."));
        assert!(check("alice@example.com", "@."));
        assert!(!check("alice@example.com", "."));
    }

    #[test]
    fn test_no_case_folding() {
        assert!(!check("alice@Example.com", "alice@example.com"));
        assert!(!check("Alice@example.com", "alice@example.com"));
    }

    #[test]
    fn test_malformed_never_matches() {
        assert!(!check("@example.com", "@example.com"));
        assert!(!check("alice@", "alice@"));
        assert!(!check("", ""));
        assert!(!check("example.com", "alice@"));
    }

    fn arb_identity_text() -> impl Strategy<Value = String> {
        (
            prop::option::of("[a-z0-9_-]{1,10}"),
            prop::collection::vec("[a-z0-9-]{1,8}", 1..5),
        )
            .prop_map(|(user, labels)| {
                let domain = labels.join(".");
                match user {
                    Some(user) => format!("{user}@{domain}"),
                    None => domain,
                }
            })
    }

    proptest! {
        /// Every identity matches itself.
        #[test]
        fn prop_reflexive(text in arb_identity_text()) {
            let id = Identity::parse(text.as_bytes());
            prop_assert!(matches(&id, &id));
        }

        /// Every generalization step still applies to the identity it came from.
        #[test]
        fn prop_origin_matches_every_step(text in arb_identity_text()) {
            let id = Identity::parse(text.as_bytes());
            for step in Selector::new(&id).unwrap() {
                prop_assert!(
                    matches(&id, &step.pattern()),
                    "{} should match step {}",
                    id,
                    step.pattern()
                );
            }
        }
    }
}
