//! Error types for nym attestation proving and verification

use thiserror::Error;

/// Result type alias for nym operations
pub type Result<T> = std::result::Result<T, NymError>;

/// Faults raised by external collaborators: asset loading, witness
/// generation and the proof system. Callers may retry these.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Asset could not be fetched
    #[error("failed to load asset {uri}: {reason}")]
    Asset { uri: String, reason: String },

    /// Asset bytes do not match the pinned digest
    #[error("asset {uri} failed integrity check: expected blake3 {expected}, computed {actual}")]
    Integrity {
        uri: String,
        expected: String,
        actual: String,
    },

    #[error("witness generation failed: {0}")]
    Witness(String),

    #[error("proof generation failed: {0}")]
    Prover(String),

    #[error("proof verification failed: {0}")]
    Verifier(String),

    /// Blocking task panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(String),
}

/// Errors surfaced by the prover and by attestation decoding
#[derive(Debug, Error)]
pub enum NymError {
    /// The nym-binding and content signatures recover to different keys
    #[error("nym signer {nym_signer} does not match content signer {content_signer}")]
    InconsistentSigners {
        nym_signer: String,
        content_signer: String,
    },

    /// Signer is not a member of the eligibility tree
    #[error("invalid merkle proof: {0}")]
    InvalidMerkleProof(String),

    /// Signature bytes are malformed or do not recover to a key
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Typed-message values do not fit their schema
    #[error("invalid typed data: {0}")]
    InvalidTypedData(String),

    /// Attestation bytes could not be decoded
    #[error("malformed attestation: {0}")]
    MalformedAttestation(String),

    #[error(transparent)]
    BackendFailure(#[from] BackendError),
}

impl NymError {
    /// `true` when the caller's inputs cannot produce an attestation, `false`
    /// when the system failed and the call may be retried.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, NymError::BackendFailure(_))
    }
}
