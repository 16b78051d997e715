use std::sync::Arc;

use nym_common::{Attestation, Content, ContentMessage, ProofBackend};
use nym_prover::NymProver;
use nym_test_fixtures::{fixtures, Deployment, FailingBackend};
use nym_verifier::NymVerifier;

const NYM_NAME: &str = "anon-abc123";

fn prover_for(deployment: &Deployment) -> NymProver {
    NymProver::new(
        deployment.prover_config.clone(),
        deployment.backend.clone(),
        deployment.witness_gen.clone(),
    )
    .with_fetcher(deployment.fetcher.clone())
    .with_asset_cache(deployment.assets.clone())
}

fn verifier_with(deployment: &Deployment, backend: Arc<dyn ProofBackend>) -> NymVerifier {
    NymVerifier::new(deployment.verifier_config.clone(), backend)
        .with_fetcher(deployment.fetcher.clone())
        .with_asset_cache(deployment.assets.clone())
}

fn verifier_for(deployment: &Deployment) -> NymVerifier {
    verifier_with(deployment, deployment.backend.clone())
}

async fn attest(deployment: &Deployment, nym_name: &str, content: &ContentMessage) -> Vec<u8> {
    let member = fixtures().member();
    prover_for(deployment)
        .prove(
            nym_name,
            content,
            &member.sign_nym(nym_name).unwrap(),
            &member.sign_content(content).unwrap(),
            &fixtures().member_proof(),
        )
        .await
        .unwrap()
}

fn hello() -> ContentMessage {
    ContentMessage::post("", "hello", 1_700_000_000)
}

#[tokio::test]
async fn test_prove_then_verify() {
    let deployment = Deployment::new();
    let content = hello();
    let attestation = attest(&deployment, NYM_NAME, &content).await;

    assert!(verifier_for(&deployment).verify(&content, &attestation).await);
    assert_eq!(deployment.backend.verify_calls(), 1);
}

#[tokio::test]
async fn test_edited_body_fails() {
    let deployment = Deployment::new();
    let attestation = attest(&deployment, NYM_NAME, &hello()).await;

    let mut edited = hello();
    edited.body = "hello!".into();
    assert!(!verifier_for(&deployment).verify(&edited, &attestation).await);
    // Rejected locally, before the proof system.
    assert_eq!(deployment.backend.verify_calls(), 0);
}

#[tokio::test]
async fn test_renamed_nym_fails() {
    let deployment = Deployment::new();
    let content = hello();
    let bytes = attest(&deployment, NYM_NAME, &content).await;

    let mut attestation = Attestation::from_bytes(&bytes).unwrap();
    attestation.nym_name = "anon-abc124".into();
    let renamed = attestation.to_bytes().unwrap();
    assert!(!verifier_for(&deployment).verify(&content, &renamed).await);
}

#[tokio::test]
async fn test_swapped_public_input_fails_in_backend() {
    let deployment = Deployment::new();
    let content = hello();
    let bytes = attest(&deployment, NYM_NAME, &content).await;

    // A root the proof was not made for passes the local check but not the proof.
    let mut attestation = Attestation::from_bytes(&bytes).unwrap();
    attestation.public_input.root = nym_common::Fp::from(7u64);
    let forged = attestation.to_bytes().unwrap();
    assert!(!verifier_for(&deployment).verify(&content, &forged).await);
    assert_eq!(deployment.backend.verify_calls(), 1);
}

#[tokio::test]
async fn test_garbage_and_truncated_bytes_fail() {
    let deployment = Deployment::new();
    let content = hello();
    let verifier = verifier_for(&deployment);

    assert!(!verifier.verify(&content, &[]).await);
    assert!(!verifier.verify(&content, &[0xff; 700]).await);

    let bytes = attest(&deployment, NYM_NAME, &content).await;
    for len in [1, 4, bytes.len() / 2, bytes.len() - 1] {
        assert!(!verifier.verify(&content, &bytes[..len]).await);
    }
    let mut flipped = bytes.clone();
    let last = flipped.len() - 1;
    flipped[last] ^= 0x01;
    assert!(!verifier.verify(&content, &flipped).await);
    assert_eq!(deployment.backend.verify_calls(), 0);
}

#[tokio::test]
async fn test_backend_failure_is_false() {
    let deployment = Deployment::new();
    let content = hello();
    let attestation = attest(&deployment, NYM_NAME, &content).await;

    let verifier = verifier_with(&deployment, Arc::new(FailingBackend));
    assert!(!verifier.verify(&content, &attestation).await);
}

#[tokio::test]
async fn test_missing_circuit_is_false() {
    let mut deployment = Deployment::new();
    let content = hello();
    let attestation = attest(&deployment, NYM_NAME, &content).await;

    deployment.verifier_config.circuit_url = "mem://nowhere/circuit".into();
    assert!(!verifier_for(&deployment).verify(&content, &attestation).await);
}

#[tokio::test]
async fn test_content_record_binds_nym_name() {
    let deployment = Deployment::new();
    let message = hello();
    let attestation = attest(&deployment, NYM_NAME, &message).await;
    let verifier = verifier_for(&deployment);

    let mut record = Content {
        message,
        nym_name: NYM_NAME.into(),
        attestation,
    };
    assert!(verifier.verify_content(&record).await);

    record.nym_name = "someone-else".into();
    assert!(!verifier.verify_content(&record).await);
}

#[tokio::test]
async fn test_local_check_matches_verifier() {
    let deployment = Deployment::new();
    let content = hello();
    let bytes = attest(&deployment, NYM_NAME, &content).await;
    let attestation = Attestation::from_bytes(&bytes).unwrap();

    assert!(NymVerifier::verify_public_input(&content, &attestation));
    let reply = ContentMessage::reply(content.post_id(), "hello", content.timestamp);
    assert!(!NymVerifier::verify_public_input(&reply, &attestation));
}
