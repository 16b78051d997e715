//! Eligibility-tree membership proofs.

use serde::{Deserialize, Serialize};

use crate::{
    error::{NymError, Result},
    poseidon_hash, Fp, TREE_DEPTH,
};

/// Path from a leaf to `root`. `path_indices[i] == 0` puts the running node
/// on the left at level `i`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    #[serde(with = "crate::ser::fp_hex_vec")]
    pub siblings: Vec<Fp>,
    pub path_indices: Vec<u8>,
    #[serde(with = "crate::ser::fp_hex")]
    pub root: Fp,
}

impl MerkleProof {
    /// Folds `leaf` up the path. Fails on wrong depth or non-binary indices.
    pub fn compute_root(&self, leaf: Fp) -> Result<Fp> {
        if self.siblings.len() != TREE_DEPTH || self.path_indices.len() != TREE_DEPTH {
            return Err(NymError::InvalidMerkleProof(format!(
                "expected depth {TREE_DEPTH}, got {} siblings and {} indices",
                self.siblings.len(),
                self.path_indices.len()
            )));
        }
        self.siblings
            .iter()
            .zip(&self.path_indices)
            .enumerate()
            .try_fold(leaf, |node, (level, (sibling, index))| match index {
                0 => Ok(hash_nodes(node, *sibling)),
                1 => Ok(hash_nodes(*sibling, node)),
                other => Err(NymError::InvalidMerkleProof(format!(
                    "path index {other} at level {level}"
                ))),
            })
    }

    pub fn verify(&self, leaf: Fp) -> bool {
        self.compute_root(leaf).map_or(false, |root| root == self.root)
    }
}

pub fn hash_nodes(left: Fp, right: Fp) -> Fp {
    poseidon_hash([left, right])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single leaf at index 0 of an otherwise empty tree.
    fn lone_leaf_proof(leaf: Fp) -> MerkleProof {
        let mut zero = Fp::from(0u64);
        let mut node = leaf;
        let mut siblings = Vec::with_capacity(TREE_DEPTH);
        for _ in 0..TREE_DEPTH {
            siblings.push(zero);
            node = hash_nodes(node, zero);
            zero = hash_nodes(zero, zero);
        }
        MerkleProof {
            siblings,
            path_indices: vec![0; TREE_DEPTH],
            root: node,
        }
    }

    #[test]
    fn verify_accepts_the_proven_leaf_only() {
        let leaf = Fp::from(99u64);
        let proof = lone_leaf_proof(leaf);
        assert!(proof.verify(leaf));
        assert!(!proof.verify(Fp::from(98u64)));
    }

    #[test]
    fn flipped_index_changes_root() {
        let leaf = Fp::from(99u64);
        let mut proof = lone_leaf_proof(leaf);
        proof.path_indices[3] = 1;
        assert!(!proof.verify(leaf));
    }

    #[test]
    fn wrong_depth_and_bad_index_are_rejected() {
        let leaf = Fp::from(99u64);
        let mut short = lone_leaf_proof(leaf);
        short.siblings.pop();
        assert!(matches!(
            short.compute_root(leaf),
            Err(NymError::InvalidMerkleProof(_))
        ));

        let mut bad_index = lone_leaf_proof(leaf);
        bad_index.path_indices[0] = 2;
        assert!(bad_index.compute_root(leaf).is_err());
        assert!(!bad_index.verify(leaf));
    }

    #[test]
    fn json_uses_hex_field_elements() {
        let proof = lone_leaf_proof(Fp::from(1u64));
        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["pathIndices"].as_array().unwrap().len(), TREE_DEPTH);
        let root = json["root"].as_str().unwrap();
        assert!(root.starts_with("0x") && root.len() == 66);
        let back: MerkleProof = serde_json::from_value(json).unwrap();
        assert_eq!(back, proof);
    }
}
