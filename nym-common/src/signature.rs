//! Recoverable secp256k1 signatures and the keys they recover to.

use std::{fmt, str::FromStr};

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    affine_coordinates,
    error::{NymError, Result},
    fp_to_bytes, poseidon_hash, reduce_be_bytes_to_fp,
    typed_data::{keccak256, TypedMessage},
    Fp, Secp256k1Affine,
};

/// Length of the `r || s || v` form returned by wallet RPCs.
pub const RPC_SIGNATURE_BYTES: usize = 65;

/// ECDSA signature with its recovery id, `v` normalized to 27 or 28.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    r: [u8; 32],
    s: [u8; 32],
    v: u8,
}

impl RecoverableSignature {
    /// Accepts `v` in `{0, 1, 27, 28}`.
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Result<Self> {
        let v = match v {
            0 | 1 => v + 27,
            27 | 28 => v,
            other => {
                return Err(NymError::InvalidSignature(format!(
                    "unsupported recovery byte {other}"
                )))
            }
        };
        Ok(Self { r, s, v })
    }

    pub fn from_rpc_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != RPC_SIGNATURE_BYTES {
            return Err(NymError::InvalidSignature(format!(
                "expected {RPC_SIGNATURE_BYTES} bytes, got {}",
                bytes.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Self::new(r, s, bytes[64])
    }

    pub fn to_rpc_bytes(&self) -> [u8; RPC_SIGNATURE_BYTES] {
        let mut out = [0u8; RPC_SIGNATURE_BYTES];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    pub fn v(&self) -> u8 {
        self.v
    }

    /// Parity of `R.y`, carried by the recovery id.
    pub fn y_is_odd(&self) -> bool {
        self.v == 28
    }

    /// Recovers the signing key over a 32-byte prehash.
    pub fn recover(&self, digest: &[u8; 32]) -> Result<SignerKey> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        let signature = Signature::from_slice(&rs)
            .map_err(|err| NymError::InvalidSignature(err.to_string()))?;
        let recovery_id = RecoveryId::from_byte(self.v - 27)
            .ok_or_else(|| NymError::InvalidSignature(format!("bad recovery byte {}", self.v)))?;
        // k256 only recovers from low-s signatures. `(r, n - s)` with the
        // opposite parity recovers the same key.
        let (signature, recovery_id) = match signature.normalize_s() {
            Some(low) => (
                low,
                RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
            ),
            None => (signature, recovery_id),
        };
        let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
            .map_err(|err| NymError::InvalidSignature(err.to_string()))?;
        SignerKey::from_verifying_key(&key)
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({self})")
    }
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_rpc_bytes()))
    }
}

impl FromStr for RecoverableSignature {
    type Err = NymError;

    fn from_str(value: &str) -> Result<Self> {
        let digits = value.strip_prefix("0x").unwrap_or(value);
        let bytes =
            hex::decode(digits).map_err(|err| NymError::InvalidSignature(err.to_string()))?;
        Self::from_rpc_bytes(&bytes)
    }
}

impl Serialize for RecoverableSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecoverableSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Uncompressed secp256k1 public key, big-endian affine coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignerKey {
    x: [u8; 32],
    y: [u8; 32],
}

impl SignerKey {
    pub fn from_verifying_key(key: &VerifyingKey) -> Result<Self> {
        let point = key.to_encoded_point(false);
        match (point.x(), point.y()) {
            (Some(x), Some(y)) => {
                let mut out = Self {
                    x: [0u8; 32],
                    y: [0u8; 32],
                };
                out.x.copy_from_slice(x);
                out.y.copy_from_slice(y);
                Ok(out)
            }
            _ => Err(NymError::InvalidSignature(
                "recovered key is the identity".into(),
            )),
        }
    }

    /// `None` for the point at infinity.
    pub fn from_affine(point: &Secp256k1Affine) -> Option<Self> {
        let (x, y) = affine_coordinates(point)?;
        Some(Self {
            x: fp_to_bytes(&x),
            y: fp_to_bytes(&y),
        })
    }

    pub fn x(&self) -> &[u8; 32] {
        &self.x
    }

    pub fn y(&self) -> &[u8; 32] {
        &self.y
    }

    /// Eligibility-tree leaf: `Poseidon(x, y)`.
    pub fn leaf(&self) -> Fp {
        poseidon_hash([reduce_be_bytes_to_fp(&self.x), reduce_be_bytes_to_fp(&self.y)])
    }

    /// Last 20 bytes of `keccak256(x || y)`.
    pub fn address(&self) -> [u8; 20] {
        let hash = keccak256(&[&self.x, &self.y]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        address
    }

    pub fn address_hex(&self) -> String {
        format!("0x{}", hex::encode(self.address()))
    }
}

/// Recovers who signed `message`; used for actions that are not pseudonymous.
pub fn recover_signer(signature: &RecoverableSignature, message: &TypedMessage) -> Result<SignerKey> {
    signature.recover(&message.digest())
}
