// nym/nym-common/src/lib.rs
// Numan Thabit 2025

pub mod assets;
pub mod attestation;
pub mod backend;
pub mod config;
pub mod content;
pub mod effective;
pub mod error;
pub mod merkle;
pub mod profiler;
pub mod public_input;
pub mod signature;
pub mod typed_data;
pub mod witness;

mod ser;

use halo2curves_axiom::{
    ff::{Field, PrimeField},
    group::prime::PrimeCurveAffine,
    Coordinates, CurveAffine,
};
use once_cell::sync::Lazy;
use poseidon_primitives::poseidon::primitives::{ConstantLength, Hash as PoseidonHash, Spec};

pub use halo2curves_axiom::secp256k1::{Fp, Fq, Secp256k1, Secp256k1Affine};

pub use crate::{
    assets::{AssetCache, AssetFetcher, UriFetcher},
    attestation::{is_valid_nym_handle, Attestation},
    backend::{ProofBackend, WitnessGenerator},
    config::{ProverConfig, VerifierConfig},
    content::{Content, ContentMessage, Upvote},
    effective::{EffectivePoints, EffectiveSignature},
    error::{BackendError, NymError, Result},
    merkle::MerkleProof,
    profiler::Profiler,
    public_input::{AuxiliaryProof, NymPublicInput, PublicInput},
    signature::{recover_signer, RecoverableSignature, SignerKey},
    typed_data::{TypedDomain, TypedMessage},
    witness::WitnessInput,
};

/// Depth of the eligibility tree.
pub const TREE_DEPTH: usize = 20;
/// Width of a single encoded field element.
pub const FIELD_BYTES: usize = 32;
/// Number of populated slots in the serialized public input.
pub const PUBLIC_INPUT_FIELDS: usize = 10;
/// Serialized public input: ten populated slots followed by two zero slots.
pub const PUBLIC_INPUT_BYTES: usize = 12 * FIELD_BYTES;

const POSEIDON_T: usize = 3;
const POSEIDON_RATE: usize = 2;
const POSEIDON_FULL_ROUNDS: usize = 8;
const POSEIDON_PARTIAL_ROUNDS: usize = 56;

pub fn hash_bytes_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Decodes a canonical big-endian base-field element. Values `>= p` are rejected.
pub fn fp_from_bytes(bytes: &[u8; 32]) -> Option<Fp> {
    let mut le = *bytes;
    le.reverse();
    Option::from(Fp::from_bytes(&le))
}

/// Big-endian encoding of a base-field element.
pub fn fp_to_bytes(fp: &Fp) -> [u8; 32] {
    let repr = fp.to_repr();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(repr.as_ref());
    bytes.reverse();
    bytes
}

/// Decodes a canonical big-endian scalar. Values `>= n` are rejected.
pub fn fq_from_bytes(bytes: &[u8; 32]) -> Option<Fq> {
    let mut le = *bytes;
    le.reverse();
    Option::from(Fq::from_bytes(&le))
}

pub fn fq_to_bytes(fq: &Fq) -> [u8; 32] {
    let repr = fq.to_repr();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(repr.as_ref());
    bytes.reverse();
    bytes
}

pub fn reduce_be_bytes_to_fp(bytes: &[u8; 32]) -> Fp {
    reduce_be_bytes(bytes)
}

pub fn reduce_be_bytes_to_fq(bytes: &[u8; 32]) -> Fq {
    reduce_be_bytes(bytes)
}

fn reduce_be_bytes<F: PrimeField>(bytes: &[u8]) -> F {
    let base = F::from(256);
    bytes
        .iter()
        .fold(F::ZERO, |acc, byte| acc * base + F::from(u64::from(*byte)))
}

/// `0x`-prefixed, zero-padded hex of a base-field element.
pub fn fp_to_hex(fp: &Fp) -> String {
    format!("0x{}", hex::encode(fp_to_bytes(fp)))
}

/// Parses `0x`-prefixed (or bare) hex of at most 64 digits into a canonical field element.
pub fn fp_from_hex(value: &str) -> Option<Fp> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    if digits.is_empty() || digits.len() > 2 * FIELD_BYTES {
        return None;
    }
    let padded = format!("{digits:0>64}");
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(padded, &mut bytes).ok()?;
    fp_from_bytes(&bytes)
}

/// Affine `(x, y)`, or `None` for the point at infinity.
pub(crate) fn affine_coordinates(point: &Secp256k1Affine) -> Option<(Fp, Fp)> {
    // The identity is stored as (0, 0) and `coordinates()` hands that back.
    if bool::from(<Secp256k1Affine as PrimeCurveAffine>::is_identity(point)) {
        return None;
    }
    let coordinates = Option::<Coordinates<Secp256k1Affine>>::from(point.coordinates())?;
    Some((*coordinates.x(), *coordinates.y()))
}

/// Poseidon over the secp256k1 base field, as used by the eligibility tree and
/// the nym hash.
pub fn poseidon_hash<const L: usize>(values: [Fp; L]) -> Fp {
    PoseidonHash::<Fp, NymPoseidonSpec, ConstantLength<L>, POSEIDON_T, POSEIDON_RATE>::init()
        .hash(values)
}

/// Pseudonym identifier: `Poseidon(s, s)` where `s` is the scalar of the
/// nym-binding signature.
pub fn compute_nym_hash(signature_s: &[u8; 32]) -> Fp {
    let s = reduce_be_bytes_to_fp(signature_s);
    poseidon_hash([s, s])
}

type PoseidonMds = [[Fp; POSEIDON_T]; POSEIDON_T];
type PoseidonConstants = (Vec<[Fp; POSEIDON_T]>, PoseidonMds, PoseidonMds);

/// Round constants and MDS matrices, generated once from the Grain LFSR.
static POSEIDON_CONSTANTS: Lazy<PoseidonConstants> = Lazy::new(NymPoseidonParams::constants);

/// Parameter set; generates constants through the default `Spec::constants`.
#[derive(Debug)]
struct NymPoseidonParams;

impl Spec<Fp, POSEIDON_T, POSEIDON_RATE> for NymPoseidonParams {
    fn full_rounds() -> usize {
        POSEIDON_FULL_ROUNDS
    }

    fn partial_rounds() -> usize {
        POSEIDON_PARTIAL_ROUNDS
    }

    fn sbox(val: Fp) -> Fp {
        val.pow_vartime([5])
    }

    fn secure_mds() -> usize {
        0
    }
}

/// Same parameters as [`NymPoseidonParams`], served from [`POSEIDON_CONSTANTS`].
#[derive(Debug)]
struct NymPoseidonSpec;

impl Spec<Fp, POSEIDON_T, POSEIDON_RATE> for NymPoseidonSpec {
    fn full_rounds() -> usize {
        NymPoseidonParams::full_rounds()
    }

    fn partial_rounds() -> usize {
        NymPoseidonParams::partial_rounds()
    }

    fn sbox(val: Fp) -> Fp {
        NymPoseidonParams::sbox(val)
    }

    fn secure_mds() -> usize {
        NymPoseidonParams::secure_mds()
    }

    fn constants() -> PoseidonConstants {
        POSEIDON_CONSTANTS.clone()
    }
}
