// nym/nym-prover/src/checks.rs
// Numan Thabit 2025

//! Checks that run before the proof system is touched. A failure here means
//! the caller cannot produce an attestation with these inputs.

use nym_common::{
    EffectiveSignature, Fp, MerkleProof, NymError, RecoverableSignature, Result, SignerKey,
    TypedMessage,
};

/// Recovers the key behind each signature over its own message and requires
/// them to agree.
pub fn check_consistent_signers(
    nym_sig: &RecoverableSignature,
    nym_message: &TypedMessage,
    content_sig: &RecoverableSignature,
    content_message: &TypedMessage,
) -> Result<SignerKey> {
    let nym_signer = nym_sig.recover(&nym_message.digest())?;
    let content_signer = content_sig.recover(&content_message.digest())?;
    if nym_signer != content_signer {
        return Err(NymError::InconsistentSigners {
            nym_signer: nym_signer.address_hex(),
            content_signer: content_signer.address_hex(),
        });
    }
    Ok(nym_signer)
}

/// The circuit proves `Q = s * T + U`; a signature whose effective form
/// implies some other key can never be proven.
pub fn check_effective_binding(effective: &EffectiveSignature, signer: &SignerKey) -> Result<()> {
    match effective.implied_key() {
        Some(implied) if implied == *signer => Ok(()),
        Some(implied) => Err(NymError::InvalidSignature(format!(
            "effective signature implies {}, recovered {}",
            implied.address_hex(),
            signer.address_hex()
        ))),
        None => Err(NymError::InvalidSignature(
            "effective signature points are not on the curve".into(),
        )),
    }
}

/// Hashes `signer` into a leaf and folds it up `membership`. The folded root
/// must equal the proof's root and, when pinned, `trusted_root`.
pub fn check_membership(
    signer: &SignerKey,
    membership: &MerkleProof,
    trusted_root: Option<&Fp>,
) -> Result<Fp> {
    if let Some(trusted) = trusted_root {
        if membership.root != *trusted {
            return Err(NymError::InvalidMerkleProof(
                "proof root differs from the trusted root".into(),
            ));
        }
    }
    let leaf = signer.leaf();
    let computed = membership.compute_root(leaf)?;
    if computed != membership.root {
        return Err(NymError::InvalidMerkleProof(format!(
            "signer {} is not a member under this root",
            signer.address_hex()
        )));
    }
    Ok(leaf)
}
