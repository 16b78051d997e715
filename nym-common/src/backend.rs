//! Seams to the external proof system and witness generator.
//!
//! Both collaborators are CPU-bound and synchronous; callers run them through
//! [`run_blocking`] so the async runtime is never stalled.

use crate::{error::BackendError, witness::WitnessInput, PUBLIC_INPUT_BYTES};

pub trait ProofBackend: Send + Sync {
    fn prove_circuit(
        &self,
        circuit: &[u8],
        witness: &[u8],
        public_input: &[u8; PUBLIC_INPUT_BYTES],
    ) -> Result<Vec<u8>, BackendError>;

    fn verify_circuit(
        &self,
        circuit: &[u8],
        proof: &[u8],
        public_input: &[u8; PUBLIC_INPUT_BYTES],
    ) -> Result<bool, BackendError>;
}

pub trait WitnessGenerator: Send + Sync {
    /// Maps the structured input record to the circuit's private witness
    /// using the loaded generator `module`.
    fn generate_witness(&self, module: &[u8], input: &WitnessInput) -> Result<Vec<u8>, BackendError>;
}

pub async fn run_blocking<T, F>(task: F) -> Result<T, BackendError>
where
    F: FnOnce() -> Result<T, BackendError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| BackendError::Task(err.to_string()))?
}
