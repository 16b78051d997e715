//! Effective-ECDSA transform.
//!
//! A signature `(r, s, v)` over digest `m` is rewritten as `(T, U, s)` with
//! `T = r^-1 * R` and `U = -(r^-1 * m) * G`, where `R` is the point whose x
//! coordinate is `r` and whose y parity is carried by `v`. The signer key then
//! satisfies `Q = s * T + U`, which the circuit can check without recovering
//! `Q` in-circuit. `T` and `U` depend only on `(r, v, m)` and are public.

use halo2curves_axiom::{
    ff::{Field, PrimeField},
    group::Curve,
    CurveAffine,
};

use crate::{
    affine_coordinates, fp_from_bytes, fq_from_bytes, reduce_be_bytes_to_fq,
    signature::{RecoverableSignature, SignerKey},
    typed_data::TypedMessage,
    Fp, Fq, Secp256k1, Secp256k1Affine,
};

/// `y^2 = x^3 + 7`
const CURVE_B: u64 = 7;

/// Affine coordinates of `T` and `U`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectivePoints {
    pub t_x: Fp,
    pub t_y: Fp,
    pub u_x: Fp,
    pub u_y: Fp,
}

impl EffectivePoints {
    /// Stand-in for signatures with no usable `R`. `(0, 0)` is not a curve
    /// point, so anything built on it fails verification.
    pub fn degenerate() -> Self {
        Self {
            t_x: Fp::ZERO,
            t_y: Fp::ZERO,
            u_x: Fp::ZERO,
            u_y: Fp::ZERO,
        }
    }

    /// `None` when `r` is zero or out of range, when no point has x = `r`, or
    /// when `T` or `U` is the identity.
    pub fn compute(r: &[u8; 32], y_is_odd: bool, digest: &[u8; 32]) -> Option<Self> {
        let r_scalar = fq_from_bytes(r)?;
        let r_inv = Option::<Fq>::from(r_scalar.invert())?;
        let big_r = lift_x(r, y_is_odd)?;
        let m = reduce_be_bytes_to_fq(digest);

        let t = (big_r * r_inv).to_affine();
        let u = (Secp256k1::generator() * -(r_inv * m)).to_affine();
        let (t_x, t_y) = affine_coordinates(&t)?;
        let (u_x, u_y) = affine_coordinates(&u)?;
        Some(Self { t_x, t_y, u_x, u_y })
    }

    pub fn t(&self) -> Option<Secp256k1Affine> {
        curve_point(self.t_x, self.t_y)
    }

    pub fn u(&self) -> Option<Secp256k1Affine> {
        curve_point(self.u_x, self.u_y)
    }

    /// Both points are finite and on secp256k1.
    pub fn is_on_curve(&self) -> bool {
        self.t().is_some() && self.u().is_some()
    }

    /// `s * T + U`
    pub fn implied_key(&self, s: Fq) -> Option<Secp256k1Affine> {
        let t = self.t()?;
        let u = self.u()?;
        let q = (t * s + Secp256k1::from(u)).to_affine();
        affine_coordinates(&q).map(|_| q)
    }
}

/// A recoverable signature together with its effective points over one
/// message digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectiveSignature {
    pub points: EffectivePoints,
    pub signature: RecoverableSignature,
}

impl EffectiveSignature {
    /// Never fails; malformed signatures get [`EffectivePoints::degenerate`].
    pub fn transform(signature: &RecoverableSignature, message: &TypedMessage) -> Self {
        Self::from_digest(signature, &message.digest())
    }

    pub fn from_digest(signature: &RecoverableSignature, digest: &[u8; 32]) -> Self {
        let points = EffectivePoints::compute(signature.r(), signature.y_is_odd(), digest)
            .unwrap_or_else(EffectivePoints::degenerate);
        Self {
            points,
            signature: *signature,
        }
    }

    pub fn r(&self) -> &[u8; 32] {
        self.signature.r()
    }

    pub fn v(&self) -> u8 {
        self.signature.v()
    }

    pub fn s_scalar(&self) -> Fq {
        reduce_be_bytes_to_fq(self.signature.s())
    }

    /// Key satisfying `Q = s * T + U`, if the points are valid.
    pub fn implied_key(&self) -> Option<SignerKey> {
        self.points
            .implied_key(self.s_scalar())
            .and_then(|q| SignerKey::from_affine(&q))
    }
}

/// Recomputes `(T, U)` from `(r, v, digest)` and compares with `points`.
/// Degenerate or off-curve points never match.
pub fn verify_points(points: &EffectivePoints, r: &[u8; 32], v: u8, digest: &[u8; 32]) -> bool {
    let y_is_odd = match v {
        27 => false,
        28 => true,
        _ => return false,
    };
    EffectivePoints::compute(r, y_is_odd, digest).map_or(false, |expected| expected == *points)
}

fn curve_point(x: Fp, y: Fp) -> Option<Secp256k1Affine> {
    let point = Option::<Secp256k1Affine>::from(Secp256k1Affine::from_xy(x, y))?;
    // from_xy accepts (0, 0) as the identity; affine_coordinates refuses it.
    affine_coordinates(&point).map(|_| point)
}

fn lift_x(x_bytes: &[u8; 32], y_is_odd: bool) -> Option<Secp256k1Affine> {
    let x = fp_from_bytes(x_bytes)?;
    let y_squared = x.square() * x + Fp::from(CURVE_B);
    let y = Option::<Fp>::from(y_squared.sqrt())?;
    let y = if bool::from(y.is_odd()) == y_is_odd { y } else { -y };
    curve_point(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    fn sign(seed: u8, message: &TypedMessage) -> (RecoverableSignature, SignerKey) {
        let key = SigningKey::from_slice(&[seed; 32]).unwrap();
        let (signature, recovery_id) = key.sign_prehash_recoverable(&message.digest()).unwrap();
        let bytes = signature.to_bytes();
        let signature =
            RecoverableSignature::from_rpc_bytes(&[&bytes[..], &[recovery_id.to_byte()][..]].concat())
                .unwrap();
        let signer = SignerKey::from_verifying_key(key.verifying_key()).unwrap();
        (signature, signer)
    }

    #[test]
    fn implied_key_matches_signer() {
        for (seed, name) in [(1u8, "anon-abc123"), (2, "alice"), (3, "")] {
            let message = TypedMessage::nym_binding(name);
            let (signature, signer) = sign(seed, &message);
            let effective = EffectiveSignature::transform(&signature, &message);
            assert!(effective.points.is_on_curve());
            assert_eq!(effective.implied_key(), Some(signer));
        }
    }

    #[test]
    fn transform_is_deterministic() {
        let message = TypedMessage::nym_binding("anon-abc123");
        let (signature, _) = sign(4, &message);
        assert_eq!(
            EffectiveSignature::transform(&signature, &message),
            EffectiveSignature::transform(&signature, &message)
        );
    }

    #[test]
    fn verify_points_binds_digest_and_parity() {
        let message = TypedMessage::nym_binding("anon-abc123");
        let (signature, _) = sign(5, &message);
        let effective = EffectiveSignature::transform(&signature, &message);
        let digest = message.digest();

        assert!(verify_points(&effective.points, signature.r(), signature.v(), &digest));
        let other = TypedMessage::nym_binding("anon-abc124").digest();
        assert!(!verify_points(&effective.points, signature.r(), signature.v(), &other));
        let flipped_v = if signature.v() == 27 { 28 } else { 27 };
        assert!(!verify_points(&effective.points, signature.r(), flipped_v, &digest));
        assert!(!verify_points(&effective.points, signature.r(), 1, &digest));
    }

    #[test]
    fn zero_r_maps_to_degenerate_points() {
        let signature = RecoverableSignature::new([0u8; 32], [1u8; 32], 27).unwrap();
        let effective = EffectiveSignature::from_digest(&signature, &[9u8; 32]);
        assert_eq!(effective.points, EffectivePoints::degenerate());
        assert!(!effective.points.is_on_curve());
        assert_eq!(effective.implied_key(), None);
        assert!(!verify_points(&effective.points, signature.r(), 27, &[9u8; 32]));
    }

    #[test]
    fn r_without_curve_point_maps_to_degenerate_points() {
        // No secp256k1 point has x = 5.
        let mut r = [0u8; 32];
        r[31] = 5;
        assert!(lift_x(&r, false).is_none());
        let signature = RecoverableSignature::new(r, [1u8; 32], 28).unwrap();
        let effective = EffectiveSignature::from_digest(&signature, &[3u8; 32]);
        assert!(!effective.points.is_on_curve());
    }

    #[test]
    fn degenerate_points_imply_no_key() {
        let degenerate = EffectivePoints::degenerate();
        assert!(degenerate.t().is_none());
        assert!(degenerate.u().is_none());
        assert!(degenerate.implied_key(Fq::from(5u64)).is_none());
        assert!(curve_point(Fp::ZERO, Fp::ZERO).is_none());
    }
}
