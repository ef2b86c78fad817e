//! 位姿插值
//!
//! 两个位姿之间沿恒定螺旋运动（constant twist）插值：相对变换取 SE(3) 对数，
//! 缩放后再取指数。旋转和平移绕同一根螺旋轴同步进行。

use nalgebra::{Isometry3, Matrix3, Translation3, UnitQuaternion, Vector3};

const SMALL_ANGLE: f64 = 1e-9;

/// SE(3) 指数映射中的 V 矩阵：t = V(ω) · v
fn left_jacobian(omega: &Vector3<f64>) -> Matrix3<f64> {
    let theta = omega.norm();
    let w = omega.cross_matrix();
    let w2 = w * w;
    if theta < SMALL_ANGLE {
        return Matrix3::identity() + w * 0.5 + w2 / 6.0;
    }
    let theta2 = theta * theta;
    Matrix3::identity()
        + w * ((1.0 - theta.cos()) / theta2)
        + w2 * ((theta - theta.sin()) / (theta2 * theta))
}

/// V 矩阵的逆
fn left_jacobian_inverse(omega: &Vector3<f64>) -> Matrix3<f64> {
    let theta = omega.norm();
    let w = omega.cross_matrix();
    let w2 = w * w;
    if theta < SMALL_ANGLE {
        return Matrix3::identity() - w * 0.5 + w2 / 12.0;
    }
    let theta2 = theta * theta;
    let coeff = (1.0 - theta * theta.sin() / (2.0 * (1.0 - theta.cos()))) / theta2;
    Matrix3::identity() - w * 0.5 + w2 * coeff
}

/// 螺旋运动参数（角速度部分 ω，线速度部分 v）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twist {
    pub angular: Vector3<f64>,
    pub linear: Vector3<f64>,
}

impl Twist {
    /// SE(3) 对数映射
    pub fn log(pose: &Isometry3<f64>) -> Self {
        let angular = pose.rotation.scaled_axis();
        let linear = left_jacobian_inverse(&angular) * pose.translation.vector;
        Self { angular, linear }
    }

    /// SE(3) 指数映射
    pub fn exp(&self) -> Isometry3<f64> {
        let rotation = UnitQuaternion::from_scaled_axis(self.angular);
        let translation = left_jacobian(&self.angular) * self.linear;
        Isometry3::from_parts(Translation3::from(translation), rotation)
    }

    pub fn scaled(&self, s: f64) -> Self {
        Self {
            angular: self.angular * s,
            linear: self.linear * s,
        }
    }
}

/// 沿恒定螺旋运动插值
///
/// `s = 0` 返回 `from`，`s = 1` 返回 `to`。
pub fn interpolate_screw(from: &Isometry3<f64>, to: &Isometry3<f64>, s: f64) -> Isometry3<f64> {
    let relative = from.inverse() * to;
    from * Twist::log(&relative).scaled(s).exp()
}

/// 螺旋运动中点
pub fn screw_midpoint(from: &Isometry3<f64>, to: &Isometry3<f64>) -> Isometry3<f64> {
    interpolate_screw(from, to, 0.5)
}

/// 位姿平移部分到基座原点的距离
pub fn reach_of(pose: &Isometry3<f64>) -> f64 {
    pose.translation.vector.norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn pose(x: f64, y: f64, z: f64, axis_angle: Vector3<f64>) -> Isometry3<f64> {
        Isometry3::new(Vector3::new(x, y, z), axis_angle)
    }

    #[test]
    fn test_log_exp_roundtrip() {
        let p = pose(0.1, -0.2, 0.3, Vector3::new(0.3, -0.5, 1.1));
        let back = Twist::log(&p).exp();
        assert_relative_eq!(back, p, epsilon = 1e-12);
    }

    #[test]
    fn test_interpolate_endpoints() {
        let a = pose(0.2, 0.0, 0.1, Vector3::new(0.0, 0.0, 0.3));
        let b = pose(0.1, 0.3, 0.2, Vector3::new(0.4, 0.0, -0.2));
        assert_relative_eq!(interpolate_screw(&a, &b, 0.0), a, epsilon = 1e-12);
        assert_relative_eq!(interpolate_screw(&a, &b, 1.0), b, epsilon = 1e-12);
    }

    #[test]
    fn test_pure_translation_midpoint() {
        let a = Isometry3::translation(0.0, 0.0, 0.0);
        let b = Isometry3::translation(0.2, -0.4, 0.6);
        let mid = screw_midpoint(&a, &b);
        assert_relative_eq!(mid.translation.vector, Vector3::new(0.1, -0.2, 0.3), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_about_offset_axis() {
        // 绕经过 (1, 0, 0) 的 z 轴转 90°：原点沿圆弧运动而不是走直线
        let pivot = Isometry3::translation(1.0, 0.0, 0.0);
        let spin = Isometry3::rotation(Vector3::z() * FRAC_PI_2);
        let a = Isometry3::identity();
        let b = pivot * spin * pivot.inverse();

        let mid = screw_midpoint(&a, &b);
        let radius = (mid.translation.vector - Vector3::new(1.0, 0.0, 0.0)).norm();
        assert_relative_eq!(radius, 1.0, epsilon = 1e-12);
        assert_relative_eq!(mid.rotation.angle(), FRAC_PI_2 / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_midpoint_is_half_screw() {
        let a = pose(0.2, 0.1, 0.3, Vector3::new(0.1, 0.2, 0.3));
        let b = pose(-0.1, 0.25, 0.15, Vector3::new(-0.4, 0.6, 0.2));
        let mid = screw_midpoint(&a, &b);
        let half = a.inverse() * mid;
        assert_relative_eq!(a * half * half, b, epsilon = 1e-10);
    }

    #[test]
    fn test_reach_of() {
        assert_relative_eq!(reach_of(&Isometry3::translation(0.3, 0.4, 0.0)), 0.5);
    }
}
