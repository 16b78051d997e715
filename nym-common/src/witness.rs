// nym/nym-common/src/witness.rs
// Numan Thabit 2025

use serde::{Deserialize, Serialize};

use crate::{
    effective::EffectiveSignature, error::BackendError, merkle::MerkleProof,
    reduce_be_bytes_to_fp, Fp,
};

/// Input record for the witness generator, keyed by circuit signal name.
/// Field elements travel as `0x`-prefixed hex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WitnessInput {
    #[serde(with = "crate::ser::fp_hex")]
    pub nym_hash: Fp,

    #[serde(with = "crate::ser::fp_hex")]
    pub nym_sig_tx: Fp,
    #[serde(with = "crate::ser::fp_hex")]
    pub nym_sig_ty: Fp,
    #[serde(with = "crate::ser::fp_hex")]
    pub nym_sig_ux: Fp,
    #[serde(with = "crate::ser::fp_hex")]
    pub nym_sig_uy: Fp,
    /// Signature scalar `s`, which is below the base-field modulus.
    #[serde(with = "crate::ser::fp_hex")]
    pub nym_sig_s: Fp,

    #[serde(with = "crate::ser::fp_hex")]
    pub content_sig_tx: Fp,
    #[serde(with = "crate::ser::fp_hex")]
    pub content_sig_ty: Fp,
    #[serde(with = "crate::ser::fp_hex")]
    pub content_sig_ux: Fp,
    #[serde(with = "crate::ser::fp_hex")]
    pub content_sig_uy: Fp,
    #[serde(with = "crate::ser::fp_hex")]
    pub content_sig_s: Fp,

    #[serde(with = "crate::ser::fp_hex_vec")]
    pub siblings: Vec<Fp>,
    pub path_indices: Vec<u8>,
    #[serde(with = "crate::ser::fp_hex")]
    pub root: Fp,
}

impl WitnessInput {
    pub fn new(
        nym_hash: Fp,
        nym_sig: &EffectiveSignature,
        content_sig: &EffectiveSignature,
        membership: &MerkleProof,
    ) -> Self {
        Self {
            nym_hash,
            nym_sig_tx: nym_sig.points.t_x,
            nym_sig_ty: nym_sig.points.t_y,
            nym_sig_ux: nym_sig.points.u_x,
            nym_sig_uy: nym_sig.points.u_y,
            nym_sig_s: reduce_be_bytes_to_fp(nym_sig.signature.s()),
            content_sig_tx: content_sig.points.t_x,
            content_sig_ty: content_sig.points.t_y,
            content_sig_ux: content_sig.points.u_x,
            content_sig_uy: content_sig.points.u_y,
            content_sig_s: reduce_be_bytes_to_fp(content_sig.signature.s()),
            siblings: membership.siblings.clone(),
            path_indices: membership.path_indices.clone(),
            root: membership.root,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, BackendError> {
        serde_json::to_vec(self).map_err(|err| BackendError::Witness(err.to_string()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, BackendError> {
        serde_json::from_slice(bytes).map_err(|err| BackendError::Witness(err.to_string()))
    }
}
