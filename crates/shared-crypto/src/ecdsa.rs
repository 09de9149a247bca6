//! # ECDSA Signatures (secp256k1, recoverable)
//!
//! Validators sign checkpoint digests with recoverable secp256k1
//! signatures; verifiers recover the signer's 20-byte address instead of
//! being told who signed.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: signing normalizes S to the lower
//!   half of the curve order and recovery rejects high-S signatures
//! - **Constant-Time Operations**: S comparisons use the `subtle` crate
//! - Address = last 20 bytes of `keccak256(uncompressed_pubkey[1..])`

use crate::errors::CryptoError;
use crate::hashing::{keccak256, Hash};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use primitive_types::H160;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use subtle::Choice;
use zeroize::Zeroize;

/// secp256k1 curve order n
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// n/2, the malleability bound.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

// =============================================================================
// SIGNATURE TYPE
// =============================================================================

/// Recoverable ECDSA signature, 65 bytes on the wire: `r || s || v`.
///
/// Serializes as a `0x`-prefixed hex string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EcdsaSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
}

impl EcdsaSignature {
    /// Encoded length in bytes.
    pub const LENGTH: usize = 65;

    /// Encode as `r || s || v`.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// Decode from exactly 65 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != Self::LENGTH {
            return Err(CryptoError::InvalidSignatureFormat(format!(
                "expected {} bytes, got {}",
                Self::LENGTH,
                bytes.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    /// `0x`-prefixed hex encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Parse hex, with or without `0x`.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let stripped = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(stripped)
            .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Whether S is in the lower half of the curve order.
    pub fn is_low_s(&self) -> bool {
        is_low_s(&self.s)
    }
}

impl Serialize for EcdsaSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EcdsaSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(de::Error::custom)
    }
}

// =============================================================================
// KEYPAIR
// =============================================================================

/// secp256k1 signing identity.
///
/// The inner `SigningKey` zeroizes itself on drop.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Parse a hex secret key, with or without `0x`.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let stripped = text.strip_prefix("0x").unwrap_or(text);
        let mut decoded = hex::decode(stripped).map_err(|_| CryptoError::InvalidPrivateKey)?;
        if decoded.len() != 32 {
            decoded.zeroize();
            return Err(CryptoError::InvalidPrivateKey);
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();

        let result = Self::from_bytes(bytes);
        bytes.zeroize();
        result
    }

    /// Address derived from the public key.
    pub fn address(&self) -> H160 {
        address_from_pubkey(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte prehash, producing a low-S signature with `v ∈ {27, 28}`.
    pub fn sign_prehash(&self, prehash: &Hash) -> Result<EcdsaSignature, CryptoError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(prehash)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        let mut recid = recovery_id.to_byte();
        if !is_low_s(&s) {
            // Negating S mirrors R's y-parity.
            s = invert_s(&s);
            recid ^= 1;
        }

        Ok(EcdsaSignature { r, s, v: recid + 27 })
    }

    /// Secret key bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl std::fmt::Debug for Secp256k1KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// RECOVERY
// =============================================================================

/// Recover the signer's address from a signature over `prehash`.
pub fn recover_address(prehash: &Hash, signature: &EcdsaSignature) -> Result<H160, CryptoError> {
    let recovery_id = parse_recovery_id(signature.v)?;

    if !is_low_s(&signature.s) {
        return Err(CryptoError::InvalidSignatureFormat(
            "malleable signature (high S value)".to_string(),
        ));
    }

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let parsed = Signature::from_slice(&sig_bytes);
    sig_bytes.zeroize();

    let parsed = parsed.map_err(|_| {
        CryptoError::InvalidSignatureFormat("r or s out of range".to_string())
    })?;

    let recovered = VerifyingKey::recover_from_prehash(prehash, &parsed, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered))
}

/// Derive the 20-byte address from a public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> H160 {
    let encoded = public_key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point tag.
    let hash = keccak256(&encoded.as_bytes()[1..]);
    H160::from_slice(&hash[12..])
}

/// Parse recovery ID from v value (0, 1, 27, 28).
fn parse_recovery_id(v: u8) -> Result<RecoveryId, CryptoError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(CryptoError::InvalidRecoveryId(v)),
    };

    RecoveryId::try_from(id).map_err(|_| CryptoError::InvalidRecoveryId(v))
}

/// Constant-time check that `s < n/2`.
fn is_low_s(s: &[u8; 32]) -> bool {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for (s_byte, h_byte) in s.iter().zip(SECP256K1_HALF_ORDER.iter()) {
        let not_decided = !(less | greater);
        less |= not_decided & Choice::from((s_byte < h_byte) as u8);
        greater |= not_decided & Choice::from((s_byte > h_byte) as u8);
    }

    less.into()
}

/// `n - s`
fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i16 = 0;

    for i in (0..32).rev() {
        let diff = SECP256K1_ORDER[i] as i16 - s[i] as i16 - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }

    result
}
