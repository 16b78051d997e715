//! Attestation wire format.
//!
//! ```text
//! u32 BE name length | name (UTF-8)
//! u32 BE proof length | proof
//! public input (384 bytes)
//! nymSigR | nymSigV | contentSigR | contentSigV (32 bytes each)
//! ```

use crate::{
    error::{NymError, Result},
    fp_to_bytes,
    public_input::{AuxiliaryProof, PublicInput},
    ser::{write_prefixed, ByteReader},
    Fp, PUBLIC_INPUT_BYTES,
};

/// Output of a successful `prove`; immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attestation {
    pub nym_name: String,
    pub proof: Vec<u8>,
    pub public_input: PublicInput,
    pub auxiliary: AuxiliaryProof,
}

impl Attestation {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(
            8 + self.nym_name.len() + self.proof.len() + PUBLIC_INPUT_BYTES + AuxiliaryProof::BYTES,
        );
        write_prefixed(&mut out, self.nym_name.as_bytes(), "nym name")?;
        write_prefixed(&mut out, &self.proof, "proof")?;
        out.extend_from_slice(&self.public_input.serialize());
        out.extend_from_slice(&self.auxiliary.to_bytes());
        Ok(out)
    }

    /// Decodes untrusted bytes. Every failure is
    /// [`NymError::MalformedAttestation`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let name = reader.read_prefixed("nym name")?;
        let nym_name = std::str::from_utf8(name)
            .map_err(|err| NymError::MalformedAttestation(format!("nym name: {err}")))?
            .to_owned();
        let proof = reader.read_prefixed("proof")?.to_vec();
        let public_input = PublicInput::deserialize(&reader.read_array("public input")?)?;
        let auxiliary = AuxiliaryProof::from_bytes(&reader.read_array("auxiliary proof")?)?;
        reader.finish()?;
        Ok(Self {
            nym_name,
            proof,
            public_input,
            auxiliary,
        })
    }

    pub fn nym_hash(&self) -> Fp {
        self.public_input.nym_hash
    }

    pub fn root(&self) -> Fp {
        self.public_input.root
    }

    /// `{name}-{nym hash as 64 hex digits}`
    pub fn nym_handle(&self) -> String {
        nym_handle(&self.nym_name, &self.public_input.nym_hash)
    }
}

pub fn nym_handle(nym_name: &str, nym_hash: &Fp) -> String {
    format!("{}-{}", nym_name, hex::encode(fp_to_bytes(nym_hash)))
}

/// Checks the `{name}-{64 hex digits}` shape. Names may themselves contain `-`.
pub fn is_valid_nym_handle(handle: &str) -> bool {
    match handle.rsplit_once('-') {
        Some((name, hash)) => {
            !name.is_empty() && hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effective::EffectivePoints;

    fn sample() -> Attestation {
        let points = EffectivePoints {
            t_x: Fp::from(1u64),
            t_y: Fp::from(2u64),
            u_x: Fp::from(3u64),
            u_y: Fp::from(4u64),
        };
        Attestation {
            nym_name: "anon-abc123".into(),
            proof: vec![0xab; 97],
            public_input: PublicInput {
                root: Fp::from(5u64),
                nym_hash: Fp::from(0xfeed_u64),
                nym_sig: points,
                content_sig: points,
            },
            auxiliary: AuxiliaryProof {
                nym_sig_r: [7u8; 32],
                nym_sig_v: 27,
                content_sig_r: [8u8; 32],
                content_sig_v: 28,
            },
        }
    }

    #[test]
    fn bytes_round_trip() {
        let attestation = sample();
        let bytes = attestation.to_bytes().unwrap();
        assert_eq!(bytes.len(), 4 + 11 + 4 + 97 + 384 + 128);
        assert_eq!(&bytes[..4], &11u32.to_be_bytes());
        assert_eq!(Attestation::from_bytes(&bytes).unwrap(), attestation);
    }

    #[test]
    fn every_truncation_is_malformed() {
        let bytes = sample().to_bytes().unwrap();
        for len in 0..bytes.len() {
            assert!(
                matches!(
                    Attestation::from_bytes(&bytes[..len]),
                    Err(NymError::MalformedAttestation(_))
                ),
                "prefix of {len} bytes decoded"
            );
        }
    }

    #[test]
    fn trailing_bytes_are_malformed() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes.push(0);
        assert!(Attestation::from_bytes(&bytes).is_err());
    }

    #[test]
    fn oversized_length_prefix_is_malformed() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[..4].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            Attestation::from_bytes(&bytes),
            Err(NymError::MalformedAttestation(_))
        ));
    }

    #[test]
    fn invalid_utf8_name_is_malformed() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[4] = 0xff;
        assert!(Attestation::from_bytes(&bytes).is_err());
    }

    #[test]
    fn handle_embeds_padded_hash() {
        let handle = sample().nym_handle();
        assert_eq!(
            handle,
            format!("anon-abc123-{}{}", "0".repeat(60), "feed")
        );
        assert!(is_valid_nym_handle(&handle));
        assert!(!is_valid_nym_handle("anon-abc123"));
        assert!(!is_valid_nym_handle(&format!("-{}", "0".repeat(64))));
        assert!(!is_valid_nym_handle(&format!("anon-{}", "g".repeat(64))));
    }
}
