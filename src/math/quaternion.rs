//! Immutable quaternion value type used for frame correction.
//!
//! All operations are named pure functions returning new values; there are
//! no arithmetic or relational operator impls. Quaternions are compared by
//! norm only through the explicit [`Quaternion::norm_eq`] and
//! [`Quaternion::cmp_norm`] functions, since equal norm does not induce a
//! meaningful total order on orientations.

use std::cmp::Ordering;

/// A quaternion `w + i·x + j·y + k·z`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quaternion {
    pub w: f64,
    pub i: f64,
    pub j: f64,
    pub k: f64,
}

impl Quaternion {
    /// The identity rotation.
    pub const IDENTITY: Self = Self {
        w: 1.0,
        i: 0.0,
        j: 0.0,
        k: 0.0,
    };

    /// Create a quaternion from its four components.
    #[must_use]
    pub const fn new(w: f64, i: f64, j: f64, k: f64) -> Self {
        Self { w, i, j, k }
    }

    /// Rotation of `angle` radians about `axis` (normalized internally).
    #[must_use]
    pub fn from_axis_angle(axis: [f64; 3], angle: f64) -> Self {
        let len = super::norm3(axis);
        if len < 1e-12 {
            return Self::IDENTITY;
        }
        let (s, c) = (angle / 2.0).sin_cos();
        Self {
            w: c,
            i: s * axis[0] / len,
            j: s * axis[1] / len,
            k: s * axis[2] / len,
        }
    }

    /// Euclidean norm of the four components.
    #[must_use]
    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.i * self.i + self.j * self.j + self.k * self.k).sqrt()
    }

    /// Unit quaternion with the same direction; the zero quaternion
    /// normalizes to the identity.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let n = self.norm();
        if n < 1e-12 {
            return Self::IDENTITY;
        }
        Self {
            w: self.w / n,
            i: self.i / n,
            j: self.j / n,
            k: self.k / n,
        }
    }

    /// Conjugate quaternion (negated vector part).
    #[must_use]
    pub const fn conjugate(&self) -> Self {
        Self {
            w: self.w,
            i: -self.i,
            j: -self.j,
            k: -self.k,
        }
    }

    /// Inverse rotation: the conjugate of the normalized quaternion.
    #[must_use]
    pub fn inverse(&self) -> Self {
        self.normalized().conjugate()
    }

    /// Hamilton product `self ∘ other` (apply `other` first, then `self`).
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            w: self.w * other.w - self.i * other.i - self.j * other.j - self.k * other.k,
            i: self.w * other.i + self.i * other.w + self.j * other.k - self.k * other.j,
            j: self.w * other.j - self.i * other.k + self.j * other.w + self.k * other.i,
            k: self.w * other.k + self.i * other.j - self.j * other.i + self.k * other.w,
        }
    }

    /// Rotate a 3D vector by this quaternion.
    #[must_use]
    pub fn rotate(&self, v: [f64; 3]) -> [f64; 3] {
        let q = self.normalized();
        let p = Self::new(0.0, v[0], v[1], v[2]);
        let r = q.compose(&p).compose(&q.conjugate());
        [r.i, r.j, r.k]
    }

    /// Euler angles `[alpha, beta, gamma]` in degrees (z-y-x convention).
    #[must_use]
    pub fn to_euler_angles(&self) -> [f64; 3] {
        let q = self.normalized();
        let (a, b, c, d) = (q.w, q.i, q.j, q.k);
        let alpha = (2.0 * (b * c + a * d)).atan2(a * a + b * b - c * c - d * d);
        let beta = (2.0 * (a * c - b * d)).clamp(-1.0, 1.0).asin();
        let gamma = -(2.0 * (c * d + a * b)).atan2(-(a * a - b * b - c * c + d * d));
        [
            alpha.to_degrees(),
            beta.to_degrees(),
            gamma.to_degrees(),
        ]
    }

    /// Whether the two quaternions have equal norm.
    #[must_use]
    pub fn norm_eq(&self, other: &Self) -> bool {
        self.norm() == other.norm()
    }

    /// Total ordering of the two quaternions by norm.
    #[must_use]
    pub fn cmp_norm(&self, other: &Self) -> Ordering {
        self.norm().total_cmp(&other.norm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_norm_and_normalized() {
        let q = Quaternion::new(1.0, 2.0, 3.0, 4.0);
        assert_relative_eq!(q.norm(), 30.0f64.sqrt());
        assert_relative_eq!(q.normalized().norm(), 1.0, epsilon = 1e-12);
        assert_eq!(Quaternion::default().normalized(), Quaternion::IDENTITY);
    }

    #[test]
    fn test_rotate_quarter_turn_about_z() {
        let q = Quaternion::from_axis_angle([0.0, 0.0, 1.0], FRAC_PI_2);
        let v = q.rotate([1.0, 0.0, 0.0]);
        assert_relative_eq!(v[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(v[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(v[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_compose_matches_sequential_rotation() {
        let qz = Quaternion::from_axis_angle([0.0, 0.0, 1.0], 0.3);
        let qy = Quaternion::from_axis_angle([0.0, 1.0, 0.0], -0.7);
        let v = [0.2, -1.1, 0.5];
        let combined = qz.compose(&qy).rotate(v);
        let sequential = qz.rotate(qy.rotate(v));
        for c in 0..3 {
            assert_relative_eq!(combined[c], sequential[c], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_inverse_undoes_rotation() {
        let q = Quaternion::from_axis_angle([1.0, 2.0, -0.5], 1.234);
        let v = [3.0, -1.0, 0.25];
        let back = q.inverse().rotate(q.rotate(v));
        for c in 0..3 {
            assert_relative_eq!(back[c], v[c], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rotation_agrees_with_nalgebra() {
        use nalgebra::{Rotation3, Vector3};

        let axis = [0.3, -0.8, 0.52];
        let angle = 0.9;
        let q = Quaternion::from_axis_angle(axis, angle);
        let n = Rotation3::from_axis_angle(
            &nalgebra::Unit::new_normalize(Vector3::new(axis[0], axis[1], axis[2])),
            angle,
        );
        let v = [1.0, 2.0, 3.0];
        let ours = q.rotate(v);
        let theirs = n * Vector3::new(v[0], v[1], v[2]);
        for c in 0..3 {
            assert_relative_eq!(ours[c], theirs[c], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_euler_angles_pure_yaw() {
        let q = Quaternion::from_axis_angle([0.0, 0.0, 1.0], FRAC_PI_2);
        let angles = q.to_euler_angles();
        assert_relative_eq!(angles[0], 90.0, epsilon = 1e-9);
        assert_relative_eq!(angles[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_norm_comparison() {
        let small = Quaternion::new(1.0, 0.0, 0.0, 0.0);
        let big = Quaternion::new(0.0, 2.0, 0.0, 0.0);
        assert_eq!(small.cmp_norm(&big), Ordering::Less);
        assert!(small.norm_eq(&Quaternion::new(0.0, -1.0, 0.0, 0.0)));
    }
}
