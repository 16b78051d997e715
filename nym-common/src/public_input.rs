// nym/nym-common/src/public_input.rs
// Numan Thabit 2025

use crate::{
    effective::{verify_points, EffectivePoints, EffectiveSignature},
    error::{NymError, Result},
    fp_from_bytes, fp_to_bytes,
    ser::ByteReader,
    typed_data::TypedMessage,
    Fp, FIELD_BYTES, PUBLIC_INPUT_BYTES, PUBLIC_INPUT_FIELDS,
};

/// Statement the succinct proof is checked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicInput {
    pub root: Fp,
    pub nym_hash: Fp,
    pub nym_sig: EffectivePoints,
    pub content_sig: EffectivePoints,
}

impl PublicInput {
    /// Slot order shared with the circuit's public signals.
    fn ordered_fields(&self) -> [Fp; PUBLIC_INPUT_FIELDS] {
        [
            self.root,
            self.nym_sig.t_x,
            self.nym_sig.t_y,
            self.nym_sig.u_x,
            self.nym_sig.u_y,
            self.nym_hash,
            self.content_sig.t_x,
            self.content_sig.t_y,
            self.content_sig.u_x,
            self.content_sig.u_y,
        ]
    }

    /// Ten 32-byte big-endian slots, then two zero slots.
    pub fn serialize(&self) -> [u8; PUBLIC_INPUT_BYTES] {
        let mut out = [0u8; PUBLIC_INPUT_BYTES];
        for (slot, value) in out
            .chunks_exact_mut(FIELD_BYTES)
            .zip(self.ordered_fields().iter())
        {
            slot.copy_from_slice(&fp_to_bytes(value));
        }
        out
    }

    /// Rejects non-canonical field encodings and non-zero padding.
    pub fn deserialize(bytes: &[u8; PUBLIC_INPUT_BYTES]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let mut fields = [Fp::default(); PUBLIC_INPUT_FIELDS];
        for (index, field) in fields.iter_mut().enumerate() {
            let raw = reader.read_array::<FIELD_BYTES>("public input")?;
            *field = fp_from_bytes(&raw).ok_or_else(|| {
                NymError::MalformedAttestation(format!(
                    "public input slot {index} is not a canonical field element"
                ))
            })?;
        }
        let padding = reader.read_exact(reader.remaining(), "public input padding")?;
        if padding.iter().any(|byte| *byte != 0) {
            return Err(NymError::MalformedAttestation(
                "public input padding is not zero".into(),
            ));
        }

        let [root, nym_tx, nym_ty, nym_ux, nym_uy, nym_hash, content_tx, content_ty, content_ux, content_uy] =
            fields;
        Ok(Self {
            root,
            nym_hash,
            nym_sig: EffectivePoints {
                t_x: nym_tx,
                t_y: nym_ty,
                u_x: nym_ux,
                u_y: nym_uy,
            },
            content_sig: EffectivePoints {
                t_x: content_tx,
                t_y: content_ty,
                u_x: content_ux,
                u_y: content_uy,
            },
        })
    }
}

/// Parts of the two signatures sent in the clear: `r` and `v` for each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuxiliaryProof {
    pub nym_sig_r: [u8; 32],
    pub nym_sig_v: u8,
    pub content_sig_r: [u8; 32],
    pub content_sig_v: u8,
}

impl AuxiliaryProof {
    pub const BYTES: usize = 4 * FIELD_BYTES;

    pub fn from_signatures(nym_sig: &EffectiveSignature, content_sig: &EffectiveSignature) -> Self {
        Self {
            nym_sig_r: *nym_sig.r(),
            nym_sig_v: nym_sig.v(),
            content_sig_r: *content_sig.r(),
            content_sig_v: content_sig.v(),
        }
    }

    /// `r` and `v` words, `v` as a 32-byte big-endian integer.
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut out = [0u8; Self::BYTES];
        out[..32].copy_from_slice(&self.nym_sig_r);
        out[63] = self.nym_sig_v;
        out[64..96].copy_from_slice(&self.content_sig_r);
        out[127] = self.content_sig_v;
        out
    }

    pub fn from_bytes(bytes: &[u8; Self::BYTES]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let nym_sig_r = reader.read_array("nymSigR")?;
        let nym_sig_v = read_v(&mut reader, "nymSigV")?;
        let content_sig_r = reader.read_array("contentSigR")?;
        let content_sig_v = read_v(&mut reader, "contentSigV")?;
        Ok(Self {
            nym_sig_r,
            nym_sig_v,
            content_sig_r,
            content_sig_v,
        })
    }
}

fn read_v(reader: &mut ByteReader<'_>, field: &'static str) -> Result<u8> {
    let word = reader.read_array::<FIELD_BYTES>(field)?;
    let (high, low) = word.split_at(FIELD_BYTES - 1);
    if high.iter().any(|byte| *byte != 0) {
        return Err(NymError::MalformedAttestation(format!(
            "{field} does not fit in a byte"
        )));
    }
    Ok(low[0])
}

/// Public input plus everything needed to check it without the proof system:
/// the clear `(r, v)` pairs and the digests of the two signed messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NymPublicInput {
    pub public: PublicInput,
    pub auxiliary: AuxiliaryProof,
    pub nym_digest: [u8; 32],
    pub content_digest: [u8; 32],
}

impl NymPublicInput {
    pub fn new(
        public: PublicInput,
        auxiliary: AuxiliaryProof,
        nym_message: &TypedMessage,
        content_message: &TypedMessage,
    ) -> Self {
        Self {
            public,
            auxiliary,
            nym_digest: nym_message.digest(),
            content_digest: content_message.digest(),
        }
    }

    pub fn serialize(&self) -> [u8; PUBLIC_INPUT_BYTES] {
        self.public.serialize()
    }

    /// Recomputes `(T, U)` for both signatures from `(r, v, digest)` and
    /// compares them with the committed coordinates.
    pub fn verify_locally(&self) -> bool {
        verify_points(
            &self.public.nym_sig,
            &self.auxiliary.nym_sig_r,
            self.auxiliary.nym_sig_v,
            &self.nym_digest,
        ) && verify_points(
            &self.public.content_sig,
            &self.auxiliary.content_sig_r,
            self.auxiliary.content_sig_v,
            &self.content_digest,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::RecoverableSignature;
    use k256::ecdsa::SigningKey;
    use proptest::prelude::*;

    fn sign(message: &TypedMessage) -> EffectiveSignature {
        let key = SigningKey::from_slice(&[42u8; 32]).unwrap();
        let (signature, recovery_id) = key.sign_prehash_recoverable(&message.digest()).unwrap();
        let mut rpc = signature.to_bytes().to_vec();
        rpc.push(recovery_id.to_byte());
        let signature = RecoverableSignature::from_rpc_bytes(&rpc).unwrap();
        EffectiveSignature::transform(&signature, message)
    }

    fn sample() -> (NymPublicInput, TypedMessage, TypedMessage) {
        let nym_message = TypedMessage::nym_binding("anon-abc123");
        let content_message = TypedMessage::nym_binding("content stand-in");
        let nym_sig = sign(&nym_message);
        let content_sig = sign(&content_message);
        let public = PublicInput {
            root: Fp::from(11u64),
            nym_hash: Fp::from(22u64),
            nym_sig: nym_sig.points,
            content_sig: content_sig.points,
        };
        let auxiliary = AuxiliaryProof::from_signatures(&nym_sig, &content_sig);
        (
            NymPublicInput::new(public, auxiliary, &nym_message, &content_message),
            nym_message,
            content_message,
        )
    }

    #[test]
    fn serialize_follows_slot_order() {
        let (input, _, _) = sample();
        let bytes = input.serialize();
        assert_eq!(bytes.len(), 384);
        assert_eq!(bytes[..32], fp_to_bytes(&Fp::from(11u64)));
        assert_eq!(bytes[32..64], fp_to_bytes(&input.public.nym_sig.t_x));
        assert_eq!(bytes[128..160], fp_to_bytes(&input.public.nym_sig.u_y));
        assert_eq!(bytes[160..192], fp_to_bytes(&Fp::from(22u64)));
        assert_eq!(bytes[288..320], fp_to_bytes(&input.public.content_sig.u_y));
        assert!(bytes[320..].iter().all(|byte| *byte == 0));
        assert_eq!(PublicInput::deserialize(&bytes).unwrap(), input.public);
    }

    #[test]
    fn deserialize_rejects_padding_and_non_canonical_slots() {
        let (input, _, _) = sample();
        let mut bytes = input.serialize();
        bytes[383] = 1;
        assert!(PublicInput::deserialize(&bytes).is_err());

        let mut bytes = input.serialize();
        bytes[..32].copy_from_slice(&[0xff; 32]);
        assert!(matches!(
            PublicInput::deserialize(&bytes),
            Err(NymError::MalformedAttestation(_))
        ));
    }

    #[test]
    fn auxiliary_bytes_carry_v_as_word() {
        let (input, _, _) = sample();
        let bytes = input.auxiliary.to_bytes();
        assert!(bytes[32..63].iter().all(|byte| *byte == 0));
        assert_eq!(bytes[63], input.auxiliary.nym_sig_v);
        assert_eq!(AuxiliaryProof::from_bytes(&bytes).unwrap(), input.auxiliary);

        let mut bytes = bytes;
        bytes[96] = 1;
        assert!(AuxiliaryProof::from_bytes(&bytes).is_err());
    }

    #[test]
    fn verify_locally_accepts_honest_input() {
        let (input, _, _) = sample();
        assert!(input.verify_locally());
    }

    #[test]
    fn verify_locally_rejects_swapped_messages() {
        let (input, nym_message, content_message) = sample();
        let swapped = NymPublicInput::new(
            input.public,
            input.auxiliary,
            &content_message,
            &nym_message,
        );
        assert!(!swapped.verify_locally());
    }

    #[test]
    fn verify_locally_rejects_degenerate_points() {
        let (mut input, _, _) = sample();
        input.public.content_sig = EffectivePoints::degenerate();
        assert!(!input.verify_locally());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn bit_flip_in_r_v_or_message_is_rejected(target in 0usize..6, byte in 0usize..32, bit in 0u8..8) {
            let (mut input, _, _) = sample();
            let mask = 1u8 << bit;
            match target {
                0 => input.auxiliary.nym_sig_r[byte] ^= mask,
                1 => input.auxiliary.content_sig_r[byte] ^= mask,
                2 => input.nym_digest[byte] ^= mask,
                3 => input.content_digest[byte] ^= mask,
                4 => input.auxiliary.nym_sig_v ^= mask,
                _ => input.auxiliary.content_sig_v ^= mask,
            }
            prop_assert!(!input.verify_locally());
        }
    }
}
