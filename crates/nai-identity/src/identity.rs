//! Network access identifier type.
//!
//! An [`Identity`] is a borrowed view of a `user@domain` or bare `domain`
//! byte string. The same shape doubles as a selector [`Pattern`], which may
//! carry an empty user (any user) or a `.`-led domain (suffix match).
//!
//! # Safety Invariants
//!
//! ## Success Conditions
//! - An identity is well-formed only when:
//!   1. The domain is non-empty
//!   2. A present user is non-empty
//!
//! ## Acceptable Partial Failure
//! - [`Identity::parse`] never fails; malformed results are reported by
//!   consumers that require well-formedness
//!
//! ## Forbidden States
//! - An identity owning its bytes (it is always a view into a caller buffer)

use core::fmt;

use crate::error::IdentityError;

/// A selector pattern: same shape as an [`Identity`], different role.
pub type Pattern<'a> = Identity<'a>;

/// A peer identity in `user@domain` or bare `domain` form.
///
/// Absence of the user (`None`) is distinct from an empty user
/// (`Some(b"")`). Comparison is byte-exact throughout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Identity<'a> {
    user: Option<&'a [u8]>,
    domain: &'a [u8],
}

impl<'a> Identity<'a> {
    /// Build an identity from already separated parts.
    pub const fn new(user: Option<&'a [u8]>, domain: &'a [u8]) -> Self {
        Self { user, domain }
    }

    /// Split a stable buffer on its last `@`.
    ///
    /// Bytes before the `@` form the user (possibly empty), bytes after it
    /// the domain. Without an `@` the user is absent and the whole buffer
    /// is the domain.
    pub fn parse(stable: &'a [u8]) -> Self {
        match stable.iter().rposition(|&b| b == b'@') {
            Some(at) => Self {
                user: Some(&stable[..at]),
                domain: &stable[at + 1..],
            },
            None => Self {
                user: None,
                domain: stable,
            },
        }
    }

    /// The user part, if an `@` was present.
    pub fn user(&self) -> Option<&'a [u8]> {
        self.user
    }

    /// The domain part.
    pub fn domain(&self) -> &'a [u8] {
        self.domain
    }

    /// Check the identity invariants: non-empty domain, non-empty user if present.
    pub fn validate(&self) -> Result<(), IdentityError> {
        if matches!(self.user, Some(user) if user.is_empty()) {
            return Err(IdentityError::EmptyUser);
        }
        self.validate_pattern()
    }

    /// Check the pattern invariants: only the domain must be non-empty.
    pub fn validate_pattern(&self) -> Result<(), IdentityError> {
        if self.domain.is_empty() {
            return Err(IdentityError::EmptyDomain);
        }
        Ok(())
    }

    /// Whether this value satisfies the identity invariants.
    pub fn is_well_formed(&self) -> bool {
        self.validate().is_ok()
    }

    /// Whether, read as a pattern, the user matches any identity user.
    pub fn has_wildcard_user(&self) -> bool {
        matches!(self.user, Some(user) if user.is_empty())
    }

    /// Whether, read as a pattern, the domain is a suffix match.
    pub fn has_suffix_domain(&self) -> bool {
        self.domain.first() == Some(&b'.')
    }

    /// Length of [`render`](Self::render) without allocating.
    pub fn rendered_len(&self) -> usize {
        match self.user {
            Some(user) => user.len() + 1 + self.domain.len(),
            None => self.domain.len(),
        }
    }

    /// Append the textual form to `out`. No terminating NUL is written.
    pub fn render_into(&self, out: &mut Vec<u8>) {
        out.reserve(self.rendered_len());
        if let Some(user) = self.user {
            out.extend_from_slice(user);
            out.push(b'@');
        }
        out.extend_from_slice(self.domain);
    }

    /// The textual form, the exact inverse of [`parse`](Self::parse).
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.rendered_len());
        self.render_into(&mut out);
        out
    }

    /// Whether this identity matches `pattern`; see [`crate::matches`].
    pub fn matches(&self, pattern: &Pattern<'_>) -> bool {
        crate::matching::matches(self, pattern)
    }
}

impl fmt::Display for Identity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = self.user {
            write!(f, "{}@", user.escape_ascii())?;
        }
        write!(f, "{}", self.domain.escape_ascii())
    }
}
