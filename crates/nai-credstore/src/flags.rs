//! Credential flags word and flag-based filtering.
//!
//! The first four bytes of every credential record hold these flags in
//! network byte order. Bits 0-7 carry the credential kind; the rest are
//! independent flags. Unknown bits are retained so that re-encoding a
//! record never loses information.

use bitflags::bitflags;

bitflags! {
    /// Flags of a local identity credential.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CredentialFlags: u32 {
        /// Usable when acting as TLS client
        const ROLE_CLIENT = 0x0000_0100;
        /// Usable when acting as TLS server
        const ROLE_SERVER = 0x0000_0200;
        /// Usable in both roles
        const ROLE_BOTH = Self::ROLE_CLIENT.bits() | Self::ROLE_SERVER.bits();
        /// No PKCS #11 key locator is stored
        const NO_PKCS11 = 0x0000_1000;
        /// Public data holds a certificate chain
        const CHAINED = 0x0000_2000;
        /// The chain must be completed before use
        const NEEDS_CHAIN = 0x0000_4000;
    }
}

impl CredentialFlags {
    /// Bits holding the [`CredentialKind`] code.
    pub const KIND_MASK: u32 = 0x0000_00ff;

    /// The credential kind, if the kind code is a known one.
    pub fn kind(self) -> Option<CredentialKind> {
        CredentialKind::from_code((self.bits() & Self::KIND_MASK) as u8)
    }

    /// Replace the kind code, keeping all other bits.
    pub fn with_kind(self, kind: CredentialKind) -> Self {
        Self::from_bits_retain((self.bits() & !Self::KIND_MASK) | u32::from(kind.code()))
    }

    /// Whether the credential may be used in `role`.
    pub fn supports(self, role: Role) -> bool {
        match role {
            Role::Client => self.contains(Self::ROLE_CLIENT),
            Role::Server => self.contains(Self::ROLE_SERVER),
        }
    }
}

/// Kind of public credential held in a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    /// X.509 certificate
    X509,
    /// OpenPGP public key
    OpenPgp,
    /// SRP verifier
    Srp,
    /// Kerberos ticket
    Krb5,
}

impl CredentialKind {
    /// Decode a kind code from the low flags byte.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::X509),
            2 => Some(Self::OpenPgp),
            3 => Some(Self::Srp),
            4 => Some(Self::Krb5),
            _ => None,
        }
    }

    /// The kind code stored in the low flags byte.
    pub fn code(self) -> u8 {
        match self {
            Self::X509 => 1,
            Self::OpenPgp => 2,
            Self::Srp => 3,
            Self::Krb5 => 4,
        }
    }
}

/// TLS role a credential is requested for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Acting as TLS client
    Client,
    /// Acting as TLS server
    Server,
}

/// Flag-level selection of credentials, applied before a full decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CredentialFilter {
    /// Required credential kind (None = any)
    pub kind: Option<CredentialKind>,
    /// Required role (None = any)
    pub role: Option<Role>,
}

impl CredentialFilter {
    /// A filter accepting every credential.
    pub fn any() -> Self {
        Self::default()
    }

    /// Require a credential kind.
    pub fn with_kind(mut self, kind: CredentialKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Require a role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Whether a credential with these flags passes the filter.
    pub fn accepts(&self, flags: CredentialFlags) -> bool {
        if let Some(kind) = self.kind {
            if flags.kind() != Some(kind) {
                return false;
            }
        }
        match self.role {
            Some(role) => flags.supports(role),
            None => true,
        }
    }
}
