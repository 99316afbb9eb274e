//! Error types for the identity layer.

use thiserror::Error;

/// Well-formedness violations of an identity or selector pattern.
///
/// Parsing never fails; these are reported by consumers that need a
/// well-formed value, such as [`Selector::new`](crate::Selector::new).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The identity contains an `@` with nothing in front of it.
    #[error("identity has an empty user before '@'")]
    EmptyUser,

    /// The domain part is empty.
    #[error("identity has an empty domain")]
    EmptyDomain,
}
