//! Stepwise generalization of an identity into selector patterns.
//!
//! A [`Selector`] starts at the identity itself and relaxes it one step at a
//! time, most specific first:
//!
//! ```text
//! alice@mail.example.com -> mail.example.com -> .example.com -> .com -> .
//! example.com            -> .com             -> .
//! ```
//!
//! The first step drops the user. Every later step strips the leftmost
//! domain label, leaving a `.`-led suffix, until the root sentinel `.` is
//! reached. The selector borrows the identity's buffer and allocates nothing,
//! so it can be dropped at any point of the iteration.

use crate::error::IdentityError;
use crate::identity::{Identity, Pattern};

/// The most general domain pattern, terminating every generalization.
pub const ROOT_DOMAIN: &[u8] = b".";

/// Rendering state of the user part while generalizing.
///
/// A suppressed user is remembered so that toggling it back restores the
/// exact original slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UserState<'a> {
    Active(&'a [u8]),
    Suppressed(&'a [u8]),
}

impl<'a> UserState<'a> {
    fn toggled(self) -> Self {
        match self {
            UserState::Active(user) => UserState::Suppressed(user),
            UserState::Suppressed(user) => UserState::Active(user),
        }
    }
}

/// Iterator state over progressively less specific patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selector<'a> {
    user: Option<UserState<'a>>,
    domain: &'a [u8],
}

impl<'a> Selector<'a> {
    /// Start generalizing a well-formed identity.
    ///
    /// The current step is the identity itself.
    pub fn new(identity: &Identity<'a>) -> Result<Self, IdentityError> {
        identity.validate()?;
        Ok(Self::start(identity))
    }

    /// Start generalizing a pattern, which may carry an empty (any) user.
    pub fn from_pattern(pattern: &Pattern<'a>) -> Result<Self, IdentityError> {
        pattern.validate_pattern()?;
        Ok(Self::start(pattern))
    }

    fn start(value: &Identity<'a>) -> Self {
        Self {
            user: value.user().map(UserState::Active),
            domain: value.domain(),
        }
    }

    /// Move to the next, less specific step.
    ///
    /// Returns `false` once the root sentinel has been reached; the state is
    /// then left unchanged.
    pub fn advance(&mut self) -> bool {
        if self.domain.is_empty() {
            return false;
        }

        match self.user {
            Some(state @ UserState::Active(user)) if !user.is_empty() => {
                self.user = Some(state.toggled());
                return true;
            }
            Some(state @ UserState::Active(_)) => {
                // An empty user renders the same either way; toggle back and
                // go on with the domain.
                self.user = Some(state.toggled().toggled());
            }
            Some(UserState::Suppressed(_)) | None => {}
        }

        if self.domain == ROOT_DOMAIN {
            return false;
        }

        self.domain = match self.domain[1..].iter().position(|&b| b == b'.') {
            Some(pos) => &self.domain[pos + 1..],
            None => ROOT_DOMAIN,
        };
        true
    }

    /// The current domain pattern.
    pub fn domain(&self) -> &'a [u8] {
        self.domain
    }

    /// Whether the user has been dropped from the rendering.
    pub fn is_user_suppressed(&self) -> bool {
        matches!(self.user, Some(UserState::Suppressed(_)))
    }

    /// Whether the root sentinel has been reached.
    pub fn is_root(&self) -> bool {
        self.domain == ROOT_DOMAIN
    }

    /// The current step as a pattern for [`crate::matches`].
    ///
    /// A suppressed user reads as the empty (any user) pattern.
    pub fn pattern(&self) -> Pattern<'a> {
        let user = match self.user {
            Some(UserState::Active(user)) => Some(user),
            Some(UserState::Suppressed(_)) => Some(&[][..]),
            None => None,
        };
        Pattern::new(user, self.domain)
    }

    /// Length of [`render`](Self::render) without allocating.
    pub fn rendered_len(&self) -> usize {
        match self.user {
            Some(UserState::Active(user)) => user.len() + 1 + self.domain.len(),
            Some(UserState::Suppressed(_)) | None => self.domain.len(),
        }
    }

    /// Append the disclosure lookup key for the current step to `out`.
    ///
    /// Never longer than the rendering of the identity the selector started
    /// from. No terminating NUL is written.
    pub fn render_into(&self, out: &mut Vec<u8>) {
        out.reserve(self.rendered_len());
        if let Some(UserState::Active(user)) = self.user {
            out.extend_from_slice(user);
            out.push(b'@');
        }
        out.extend_from_slice(self.domain);
    }

    /// The disclosure lookup key for the current step.
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.rendered_len());
        self.render_into(&mut out);
        out
    }

    /// Iterate over this step and every later one.
    pub fn steps(self) -> Steps<'a> {
        Steps {
            next: Some(self),
        }
    }
}

/// Iterator over the remaining generalization steps of a [`Selector`].
#[derive(Clone, Debug)]
pub struct Steps<'a> {
    next: Option<Selector<'a>>,
}

impl<'a> Iterator for Steps<'a> {
    type Item = Selector<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let mut following = current;
        self.next = following.advance().then_some(following);
        Some(current)
    }
}

impl core::iter::FusedIterator for Steps<'_> {}

impl<'a> IntoIterator for Selector<'a> {
    type Item = Selector<'a>;
    type IntoIter = Steps<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn keys(text: &[u8]) -> Vec<Vec<u8>> {
        let id = Identity::parse(text);
        Selector::new(&id)
            .unwrap()
            .steps()
            .map(|step| step.render())
            .collect()
    }

    #[test]
    fn test_user_identity_steps() {
        assert_eq!(
            keys(b"alice@mail.example.com"),
            vec![
                b"alice@mail.example.com".to_vec(),
                b"mail.example.com".to_vec(),
                b".example.com".to_vec(),
                b".com".to_vec(),
                b".".to_vec(),
            ]
        );
    }

    #[test]
    fn test_bare_domain_steps() {
        assert_eq!(
            keys(b"example.com"),
            vec![b"example.com".to_vec(), b".com".to_vec(), b".".to_vec()]
        );
    }

    #[test]
    fn test_single_label_and_root() {
        assert_eq!(keys(b"localhost"), vec![b"localhost".to_vec(), b".".to_vec()]);
        assert_eq!(keys(b"."), vec![b".".to_vec()]);
        assert_eq!(keys(b"bob@."), vec![b"bob@.".to_vec(), b".".to_vec()]);
    }

    #[test]
    fn test_leading_dot_is_skipped() {
        assert_eq!(
            keys(b".example.com"),
            vec![b".example.com".to_vec(), b".com".to_vec(), b".".to_vec()]
        );
    }

    #[test]
    fn test_first_step_is_identity() {
        let id = Identity::parse(b"alice@example.com");
        let selector = Selector::new(&id).unwrap();
        assert_eq!(selector.pattern(), id);
        assert_eq!(selector.render(), id.render());
    }

    #[test]
    fn test_rejects_malformed_identity() {
        assert_eq!(
            Selector::new(&Identity::parse(b"@example.com")),
            Err(IdentityError::EmptyUser)
        );
        assert_eq!(
            Selector::new(&Identity::parse(b"alice@")),
            Err(IdentityError::EmptyDomain)
        );
        assert_eq!(
            Selector::new(&Identity::parse(b"")),
            Err(IdentityError::EmptyDomain)
        );
    }

    #[test]
    fn test_wildcard_pattern_keeps_at() {
        let pattern = Pattern::parse(b"@mail.example.com");
        let rendered: Vec<Vec<u8>> = Selector::from_pattern(&pattern)
            .unwrap()
            .steps()
            .map(|step| step.render())
            .collect();
        assert_eq!(
            rendered,
            vec![
                b"@mail.example.com".to_vec(),
                b"@.example.com".to_vec(),
                b"@.com".to_vec(),
                b"@.".to_vec(),
            ]
        );
    }

    #[test]
    fn test_exhausted_selector_stays_put() {
        let id = Identity::parse(b"alice@com");
        let mut selector = Selector::new(&id).unwrap();
        assert!(selector.advance());
        assert!(selector.advance());
        assert!(selector.is_root());
        let last = selector;
        assert!(!selector.advance());
        assert!(!selector.advance());
        assert_eq!(selector, last);
    }

    #[test]
    fn test_suppressed_user_reads_as_wildcard() {
        let id = Identity::parse(b"alice@example.com");
        let mut selector = Selector::new(&id).unwrap();
        assert!(selector.advance());
        assert!(selector.is_user_suppressed());
        assert!(selector.pattern().has_wildcard_user());
        assert_eq!(selector.render(), b"example.com");
    }

    #[test]
    fn test_user_state_toggle_restores_slice() {
        let user = &b"alice"[..];
        let state = UserState::Active(user);
        assert_eq!(state.toggled(), UserState::Suppressed(user));
        assert_eq!(state.toggled().toggled(), state);
    }

    fn arb_domain() -> impl Strategy<Value = String> {
        (prop::collection::vec("[a-z0-9-]{1,8}", 1..6), any::<bool>()).prop_map(
            |(labels, leading_dot)| {
                let joined = labels.join(".");
                if leading_dot {
                    format!(".{joined}")
                } else {
                    joined
                }
            },
        )
    }

    fn arb_identity_text() -> impl Strategy<Value = String> {
        (prop::option::of("[a-z0-9._+-]{1,12}"), arb_domain()).prop_map(|(user, domain)| {
            match user {
                Some(user) => format!("{user}@{domain}"),
                None => domain,
            }
        })
    }

    proptest! {
        /// Generalization terminates at the root within (dots + 2) advances.
        #[test]
        fn prop_terminates_at_root(text in arb_identity_text()) {
            let id = Identity::parse(text.as_bytes());
            let bound = id.domain().iter().filter(|&&b| b == b'.').count() + 2;
            let mut selector = Selector::new(&id).unwrap();
            let mut advances = 0;
            while selector.advance() {
                advances += 1;
                prop_assert!(advances <= bound);
            }
            prop_assert!(selector.is_root());
            prop_assert_eq!(selector.render(), b".".to_vec());
        }

        /// No step renders longer than the step before it.
        #[test]
        fn prop_rendering_never_grows(text in arb_identity_text()) {
            let id = Identity::parse(text.as_bytes());
            let lengths: Vec<usize> = Selector::new(&id)
                .unwrap()
                .steps()
                .map(|step| step.render().len())
                .collect();
            prop_assert!(lengths[0] == text.len());
            for pair in lengths.windows(2) {
                prop_assert!(pair[1] <= pair[0]);
            }
        }

        /// Parsing a rendering reproduces it byte for byte.
        #[test]
        fn prop_render_parse_roundtrip(text in arb_identity_text()) {
            let rendered = Identity::parse(text.as_bytes()).render();
            prop_assert_eq!(Identity::parse(&rendered).render(), rendered);
        }
    }
}
