//! Credential record codec.
//!
//! Every value in the local-identity store is one credential record:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┬─────────────────────────┐
//! │ flags (4, BE)│ key locator + NUL            │ public data             │
//! │              │ (absent when NO_PKCS11)      │ (rest of record, >= 20) │
//! └──────────────┴──────────────────────────────┴─────────────────────────┘
//! ```
//!
//! # Safety Invariants
//!
//! ## Success Conditions
//! - A record decodes only when:
//!   1. It is longer than its 4-byte flags word
//!   2. A present key locator is NUL-terminated inside the record
//!   3. The public data is at least [`MIN_PUBLIC_DATA_LEN`] bytes
//!
//! ## Forbidden States
//! - A partially decoded record handed to the caller
//! - An encoded record that would not decode back to the same fields

use crate::error::RecordError;
use crate::flags::CredentialFlags;

/// Sanity floor for public credential data.
pub const MIN_PUBLIC_DATA_LEN: usize = 20;

/// URI scheme expected on key locators in strict mode.
pub const PKCS11_URI_SCHEME: &[u8] = b"pkcs11:";

const FLAGS_LEN: usize = 4;

/// Read only the flags word of a raw record.
///
/// Checks nothing beyond the record being longer than the flags, so it works
/// on records whose locator or public data portion is malformed.
pub fn decode_flags(raw: &[u8]) -> Result<CredentialFlags, RecordError> {
    if raw.len() <= FLAGS_LEN {
        return Err(RecordError::TooShort { len: raw.len() });
    }
    let word = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
    Ok(CredentialFlags::from_bits_retain(word))
}

/// Decode a raw record with the default options.
pub fn decode(raw: &[u8]) -> Result<CredentialRecord<'_>, RecordError> {
    CredentialRecord::decode(raw)
}

/// Validation knobs for [`CredentialRecord::decode_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Require key locators to start with `pkcs11:`
    pub strict_pkcs11_uri: bool,
    /// Public data floor; values below [`MIN_PUBLIC_DATA_LEN`] are raised to it
    pub min_public_data_len: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strict_pkcs11_uri: false,
            min_public_data_len: MIN_PUBLIC_DATA_LEN,
        }
    }
}

impl DecodeOptions {
    fn public_data_floor(&self) -> usize {
        self.min_public_data_len.max(MIN_PUBLIC_DATA_LEN)
    }
}

/// A decoded credential record borrowing from its raw bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CredentialRecord<'a> {
    /// Flags word
    pub flags: CredentialFlags,
    /// PKCS #11 URI of the private key, without its NUL (None with NO_PKCS11)
    pub key_locator: Option<&'a [u8]>,
    /// Public credential, opaque
    pub public_data: &'a [u8],
}

impl<'a> CredentialRecord<'a> {
    /// Decode with the default options.
    pub fn decode(raw: &'a [u8]) -> Result<Self, RecordError> {
        Self::decode_with(raw, &DecodeOptions::default())
    }

    /// Decode, stopping at the first field that fails validation.
    pub fn decode_with(raw: &'a [u8], options: &DecodeOptions) -> Result<Self, RecordError> {
        let flags = decode_flags(raw)?;
        let body = &raw[FLAGS_LEN..];

        let (key_locator, public_data) = if flags.contains(CredentialFlags::NO_PKCS11) {
            (None, body)
        } else {
            let nul = body
                .iter()
                .position(|&b| b == 0)
                .ok_or(RecordError::UnterminatedKeyLocator)?;
            let locator = &body[..nul];
            if options.strict_pkcs11_uri && !locator.starts_with(PKCS11_URI_SCHEME) {
                return Err(RecordError::NotPkcs11Uri);
            }
            (Some(locator), &body[nul + 1..])
        };

        let min = options.public_data_floor();
        if public_data.len() < min {
            return Err(RecordError::PublicDataTooShort {
                len: public_data.len(),
                min,
            });
        }

        Ok(Self {
            flags,
            key_locator,
            public_data,
        })
    }

    /// The key locator as text, if present and valid UTF-8.
    pub fn key_locator_str(&self) -> Option<&'a str> {
        self.key_locator
            .and_then(|locator| core::str::from_utf8(locator).ok())
    }

    /// Size of the wire form.
    pub fn encoded_len(&self) -> usize {
        FLAGS_LEN + self.key_locator.map_or(0, |l| l.len() + 1) + self.public_data.len()
    }

    /// Check that encoding would produce a record that decodes back to `self`.
    pub fn validate(&self) -> Result<(), RecordError> {
        match (self.flags.contains(CredentialFlags::NO_PKCS11), self.key_locator) {
            (true, Some(_)) => return Err(RecordError::UnexpectedKeyLocator),
            (false, None) => return Err(RecordError::MissingKeyLocator),
            (false, Some(locator)) if locator.contains(&0) => {
                return Err(RecordError::EmbeddedNul)
            }
            _ => {}
        }
        if self.public_data.len() < MIN_PUBLIC_DATA_LEN {
            return Err(RecordError::PublicDataTooShort {
                len: self.public_data.len(),
                min: MIN_PUBLIC_DATA_LEN,
            });
        }
        Ok(())
    }

    /// Append the wire form to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), RecordError> {
        self.validate()?;
        out.reserve(self.encoded_len());
        out.extend_from_slice(&self.flags.bits().to_be_bytes());
        if let Some(locator) = self.key_locator {
            out.extend_from_slice(locator);
            out.push(0);
        }
        out.extend_from_slice(self.public_data);
        Ok(())
    }

    /// The wire form.
    pub fn encode(&self) -> Result<Vec<u8>, RecordError> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Copy into an owned [`Credential`] found under `local_id`.
    pub fn to_credential(&self, local_id: &[u8]) -> Credential {
        Credential {
            local_id: local_id.to_vec(),
            flags: self.flags,
            key_locator: self.key_locator.map(<[u8]>::to_vec),
            public_data: self.public_data.to_vec(),
        }
    }
}

/// An owned, decoded credential as handed out by a credential cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    /// Local-identity key the record was stored under
    pub local_id: Vec<u8>,
    /// Flags word
    pub flags: CredentialFlags,
    /// PKCS #11 URI of the private key (None with NO_PKCS11)
    pub key_locator: Option<Vec<u8>>,
    /// Public credential, opaque
    pub public_data: Vec<u8>,
}

impl Credential {
    /// Borrow as a record, e.g. to re-encode it.
    pub fn record(&self) -> CredentialRecord<'_> {
        CredentialRecord {
            flags: self.flags,
            key_locator: self.key_locator.as_deref(),
            public_data: &self.public_data,
        }
    }
}
