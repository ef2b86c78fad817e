//! 角度工具

use crate::JointVector;
use std::f64::consts::{PI, TAU};

/// 将角度归一化到 [-π, π]
pub fn normalize_angle(mut angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    while angle > PI {
        angle -= TAU;
    }
    while angle < -PI {
        angle += TAU;
    }
    angle
}

/// 将解展开到离参考位置最近的一圈
///
/// 每个关节与参考值相差超过 π 时平移 ±2π，避免关节绕远路转一整圈。
pub fn unwrap_angles(solution: &JointVector, reference: &JointVector) -> JointVector {
    let mut unwrapped = *solution;
    for (q, &r) in unwrapped.iter_mut().zip(reference.iter()) {
        let diff = *q - r;
        if diff > PI {
            *q -= TAU;
        } else if diff < -PI {
            *q += TAU;
        }
    }
    unwrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_angle() {
        assert_relative_eq!(normalize_angle(0.0), 0.0);
        assert_relative_eq!(normalize_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(-3.0 * PI / 2.0), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(5.0 * TAU + 0.1), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_unwrap_toward_reference() {
        let solution = JointVector::from_element(-3.0 * PI / 2.0);
        let reference = JointVector::from_element(PI / 2.0);
        let unwrapped = unwrap_angles(&solution, &reference);
        for &q in unwrapped.iter() {
            assert_relative_eq!(q, PI / 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_unwrap_keeps_close_values() {
        let solution = JointVector::new(0.1, -0.2, 3.0, -3.0, 1.0, 0.0);
        let reference = JointVector::new(0.0, 0.0, 2.5, -2.5, 0.5, 3.0);
        assert_eq!(unwrap_angles(&solution, &reference), solution);
    }

    proptest! {
        #[test]
        fn normalized_angle_in_range(angle in -100.0..100.0f64) {
            let n = normalize_angle(angle);
            prop_assert!((-PI..=PI).contains(&n));
            prop_assert!(((angle - n) / TAU - ((angle - n) / TAU).round()).abs() < 1e-9);
        }

        #[test]
        fn unwrapped_within_pi_of_reference(q in -PI..PI, r in -PI..PI) {
            let solution = JointVector::from_element(q);
            let reference = JointVector::from_element(r);
            let unwrapped = unwrap_angles(&solution, &reference);
            prop_assert!((unwrapped[0] - r).abs() <= PI + 1e-12);
        }
    }
}
