//! Salted password hashing and verification.
//!
//! Credentials are derived with Argon2id using a fresh 16-byte salt per call
//! and a fixed 64-byte output. The stored form is `"<salt>:<digest>"`, both
//! parts URL-safe base64 without padding. Cost parameters are process
//! configuration and are not embedded in the stored text, so changing them
//! invalidates existing credentials.

use crate::error::AuthError;

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use std::fmt;
use std::str::FromStr;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;
/// Digest length in bytes.
pub const DIGEST_LEN: usize = 64;
/// Shortest salt argon2 accepts.
const MIN_SALT_LEN: usize = 8;

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65_536, // 64 MiB
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    fn to_params(self) -> Result<Params, argon2::Error> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(DIGEST_LEN),
        )
    }

    /// Check the parameters are accepted by argon2
    pub fn validate(&self) -> Result<(), AuthError> {
        self.to_params()
            .map(|_| ())
            .map_err(|e| AuthError::Config(format!("invalid Argon2 parameters: {e}")))
    }
}

/// A salted password digest
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub salt: Vec<u8>,
    pub digest: Vec<u8>,
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            URL_SAFE_NO_PAD.encode(&self.salt),
            URL_SAFE_NO_PAD.encode(&self.digest)
        )
    }
}

// Digest bytes stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("salt_len", &self.salt.len())
            .field("digest_len", &self.digest.len())
            .finish()
    }
}

impl FromStr for Credential {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (salt, digest) = match (parts.next(), parts.next(), parts.next()) {
            (Some(salt), Some(digest), None) if !salt.is_empty() && !digest.is_empty() => {
                (salt, digest)
            }
            _ => return Err(AuthError::MalformedCredential),
        };

        let salt = URL_SAFE_NO_PAD
            .decode(salt)
            .map_err(|_| AuthError::MalformedCredential)?;
        let digest = URL_SAFE_NO_PAD
            .decode(digest)
            .map_err(|_| AuthError::MalformedCredential)?;

        if salt.len() < MIN_SALT_LEN {
            return Err(AuthError::MalformedCredential);
        }

        Ok(Self { salt, digest })
    }
}

/// Derives and checks salted password digests
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: KdfParams,
}

impl CredentialHasher {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Hash a password with a freshly generated salt
    pub fn hash(&self, password: &str) -> Result<Credential, AuthError> {
        if password.is_empty() {
            return Err(AuthError::InvalidInput("Password is required".to_string()));
        }

        let mut salt = vec![0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let digest = self.derive(password, &salt)?;
        Ok(Credential { salt, digest })
    }

    /// Verify a password against stored credential text
    ///
    /// Returns `Ok(false)` on mismatch, including a stored digest of the wrong
    /// length. Fails only when the stored text cannot be parsed.
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
        let credential: Credential = stored.parse()?;
        let candidate = self.derive(password, &credential.salt)?;

        Ok(constant_time_eq(&candidate, &credential.digest))
    }

    fn derive(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>, AuthError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.to_params()?);

        let mut digest = vec![0u8; DIGEST_LEN];
        argon2.hash_password_into(password.as_bytes(), salt, &mut digest)?;
        Ok(digest)
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(KdfParams::default())
    }
}

/// Constant-time byte comparison
///
/// Unequal lengths return false immediately; equal-length inputs are always
/// scanned in full.
#[inline(never)]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    std::hint::black_box(diff) == 0
}
