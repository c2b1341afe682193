/// 3D transformation matrices and vector helpers
///
/// `Transform` is a value type: every composition call returns a new matrix
/// post-multiplied by the operation (`M' = M * Op`), so the operation called
/// last is the one applied first to local geometry. Copying a `Transform` into
/// a new binding is how a hierarchy captures a parent frame.
use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3};

use crate::error::{SceneError, SceneResult};

const EPSILON: f32 = 1e-6;

/// Normalize a vector, refusing zero-length input instead of producing NaNs
pub fn normalize(v: &Vector3<f32>) -> SceneResult<Vector3<f32>> {
    let len = v.norm();
    if len <= EPSILON || !len.is_finite() {
        return Err(SceneError::ZeroLengthVector);
    }
    Ok(v / len)
}

pub fn cross(a: &Vector3<f32>, b: &Vector3<f32>) -> Vector3<f32> {
    a.cross(b)
}

/// Validate a look-at triple and return the unnormalized view vector
pub fn check_look_at(
    eye: &Point3<f32>,
    at: &Point3<f32>,
    up: &Vector3<f32>,
) -> SceneResult<Vector3<f32>> {
    let finite = eye.iter().chain(at.iter()).chain(up.iter()).all(|c| c.is_finite());
    if !finite {
        return Err(SceneError::DegenerateCamera("eye, at and up must be finite"));
    }
    let view = at - eye;
    if !view.norm().is_finite() {
        return Err(SceneError::DegenerateCamera("view vector overflows"));
    }
    if view.norm() <= EPSILON {
        return Err(SceneError::DegenerateCamera("eye and at coincide"));
    }
    if up.norm() <= EPSILON {
        return Err(SceneError::DegenerateCamera("up vector has zero length"));
    }
    if cross(&view, up).norm() <= EPSILON * view.norm() * up.norm() {
        return Err(SceneError::DegenerateCamera("up is parallel to the view direction"));
    }
    Ok(view)
}

/// A homogeneous 4x4 transform composed by post-multiplication
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f32>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn from_matrix(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &Matrix4<f32> {
        &self.matrix
    }

    pub fn into_matrix(self) -> Matrix4<f32> {
        self.matrix
    }

    pub fn translate(self, x: f32, y: f32, z: f32) -> Self {
        self.then(&Matrix4::new_translation(&Vector3::new(x, y, z)))
    }

    pub fn scale(self, sx: f32, sy: f32, sz: f32) -> Self {
        self.then(&Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz)))
    }

    /// Rotate by `angle_deg` degrees, right-handed about `axis`
    pub fn rotate(self, angle_deg: f32, axis: Vector3<f32>) -> SceneResult<Self> {
        let axis = Unit::try_new(axis, EPSILON).ok_or(SceneError::ZeroRotationAxis)?;
        Ok(self.rotate_unit(angle_deg, &axis))
    }

    pub fn rotate_x(self, angle_deg: f32) -> Self {
        self.rotate_unit(angle_deg, &Vector3::x_axis())
    }

    pub fn rotate_y(self, angle_deg: f32) -> Self {
        self.rotate_unit(angle_deg, &Vector3::y_axis())
    }

    pub fn rotate_z(self, angle_deg: f32) -> Self {
        self.rotate_unit(angle_deg, &Vector3::z_axis())
    }

    fn rotate_unit(self, angle_deg: f32, axis: &Unit<Vector3<f32>>) -> Self {
        let rotation = Rotation3::from_axis_angle(axis, angle_deg.to_radians());
        self.then(&rotation.to_homogeneous())
    }

    /// Post-multiply by an arbitrary matrix
    pub fn then(self, op: &Matrix4<f32>) -> Self {
        Self {
            matrix: self.matrix * op,
        }
    }

    /// Right-handed view matrix looking from `eye` towards `at`
    pub fn look_at(eye: &Point3<f32>, at: &Point3<f32>, up: &Vector3<f32>) -> SceneResult<Self> {
        check_look_at(eye, at, up)?;
        Ok(Self::from_matrix(Matrix4::look_at_rh(eye, at, up)))
    }

    /// Perspective projection from a vertical field of view in degrees
    pub fn perspective(fov_deg: f32, aspect: f32, near: f32, far: f32) -> SceneResult<Self> {
        let valid = fov_deg.is_finite()
            && fov_deg > 0.0
            && fov_deg < 180.0
            && aspect.is_finite()
            && aspect > 0.0
            && near.is_finite()
            && near > 0.0
            && far.is_finite()
            && far > near;
        if !valid {
            return Err(SceneError::InvalidProjection {
                fov_deg,
                aspect,
                near,
                far,
            });
        }
        Ok(Self::from_matrix(Matrix4::new_perspective(
            aspect,
            fov_deg.to_radians(),
            near,
            far,
        )))
    }

    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(Self::from_matrix)
    }

    pub fn transpose(&self) -> Self {
        Self::from_matrix(self.matrix.transpose())
    }

    /// `transpose(inverse(self))`, failing on a singular matrix
    pub fn try_normal_matrix(&self) -> SceneResult<Self> {
        self.inverse()
            .map(|inv| inv.transpose())
            .ok_or(SceneError::SingularMatrix)
    }

    /// Normal matrix with an identity fallback when `self` is singular
    pub fn normal_matrix(&self) -> Self {
        match self.try_normal_matrix() {
            Ok(normal) => normal,
            Err(_) => {
                log::warn!("singular model matrix, using identity normal matrix");
                Self::identity()
            }
        }
    }

    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        self.matrix.transform_point(point)
    }

    pub fn transform_vector(&self, v: &Vector3<f32>) -> Vector3<f32> {
        self.matrix.transform_vector(v)
    }

    /// Apply a normal matrix to a normal, unnormalized
    pub fn transform_normal(&self, normal: &Vector3<f32>) -> Vector3<f32> {
        self.matrix.transform_vector(normal)
    }

    /// World position of this frame's local origin
    pub fn origin(&self) -> Point3<f32> {
        self.transform_point(&Point3::origin())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Create a model-view-projection matrix
pub fn mvp_matrix(
    model: &Matrix4<f32>,
    view: &Matrix4<f32>,
    projection: &Matrix4<f32>,
) -> Matrix4<f32> {
    projection * view * model
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unit_length() {
        for v in [
            Vector3::new(3.0, 4.0, 0.0),
            Vector3::new(-0.001, 0.002, 0.0005),
            Vector3::new(120.0, -7.5, 33.0),
        ] {
            let n = normalize(&v).unwrap();
            assert!((n.norm() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_normalize_zero_fails() {
        assert_eq!(
            normalize(&Vector3::zeros()),
            Err(SceneError::ZeroLengthVector)
        );
    }

    #[test]
    fn test_composition_order() {
        // translate then scale: local point is scaled first, then translated
        let m = Transform::identity().translate(1.0, 0.0, 0.0).scale(2.0, 2.0, 2.0);
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(3.0, 0.0, 0.0)).norm() < 1e-6);

        let m = Transform::identity().scale(2.0, 2.0, 2.0).translate(1.0, 0.0, 0.0);
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(4.0, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_rotation_is_right_handed_degrees() {
        let m = Transform::identity().rotate_z(90.0);
        let v = m.transform_vector(&Vector3::x());
        assert!((v - Vector3::y()).norm() < 1e-6);

        let m = Transform::identity()
            .rotate(90.0, Vector3::new(0.0, 2.0, 0.0))
            .unwrap();
        let v = m.transform_vector(&Vector3::z());
        assert!((v - Vector3::x()).norm() < 1e-6);
    }

    #[test]
    fn test_rotate_zero_axis_fails() {
        let result = Transform::identity().rotate(45.0, Vector3::zeros());
        assert_eq!(result, Err(SceneError::ZeroRotationAxis));
    }

    #[test]
    fn test_perspective_validation() {
        assert!(Transform::perspective(60.0, 1.5, 0.1, 100.0).is_ok());
        assert!(Transform::perspective(60.0, 1.5, 0.0, 100.0).is_err());
        assert!(Transform::perspective(60.0, 1.5, 10.0, 10.0).is_err());
        assert!(Transform::perspective(60.0, 1.5, 10.0, 5.0).is_err());
        assert!(Transform::perspective(0.0, 1.5, 0.1, 100.0).is_err());
        assert!(Transform::perspective(60.0, 0.0, 0.1, 100.0).is_err());
    }

    #[test]
    fn test_look_at_rejects_parallel_up() {
        let eye = Point3::new(0.0, 0.0, 0.0);
        let at = Point3::new(0.0, 5.0, 0.0);
        let result = Transform::look_at(&eye, &at, &Vector3::y());
        assert!(matches!(result, Err(SceneError::DegenerateCamera(_))));

        let result = Transform::look_at(&eye, &eye, &Vector3::y());
        assert!(matches!(result, Err(SceneError::DegenerateCamera(_))));
    }

    #[test]
    fn test_look_at_rejects_non_finite() {
        let eye = Point3::new(f32::NAN, 0.0, 0.0);
        let result = Transform::look_at(&eye, &Point3::new(0.0, 0.0, -1.0), &Vector3::y());
        assert!(matches!(result, Err(SceneError::DegenerateCamera(_))));

        let far = Point3::new(0.0, 0.0, f32::MAX);
        let result = check_look_at(&Point3::new(0.0, 0.0, -f32::MAX), &far, &Vector3::y());
        assert!(matches!(result, Err(SceneError::DegenerateCamera(_))));

        let up = Vector3::new(0.0, f32::INFINITY, 0.0);
        let result = check_look_at(&Point3::origin(), &Point3::new(0.0, 0.0, -1.0), &up);
        assert!(matches!(result, Err(SceneError::DegenerateCamera(_))));
    }

    #[test]
    fn test_look_at_maps_eye_to_origin() {
        let eye = Point3::new(1.0, 2.0, 3.0);
        let view = Transform::look_at(&eye, &Point3::origin(), &Vector3::y()).unwrap();
        assert!(view.transform_point(&eye).coords.norm() < 1e-5);
    }

    #[test]
    fn test_inverse_and_transpose() {
        let m = Transform::identity()
            .translate(1.0, -2.0, 0.5)
            .rotate_y(30.0)
            .scale(2.0, 3.0, 0.5);
        let inv = m.inverse().unwrap();
        let product = m.matrix() * inv.matrix();
        assert!((product - Matrix4::identity()).norm() < 1e-5);
        assert_eq!(m.transpose().transpose(), m);
    }

    #[test]
    fn test_normal_matrix_inverse_scales_normals() {
        let m = Transform::identity().scale(2.0, 1.0, 1.0).translate(1.0, 0.0, 0.0);
        let normal = m.normal_matrix().transform_normal(&Vector3::x());
        assert!((normal - Vector3::new(0.5, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_normal_matrix_preserves_perpendicularity() {
        let m = Transform::identity()
            .rotate_x(25.0)
            .scale(3.0, 0.5, 1.0)
            .rotate_z(40.0);
        let normal: Vector3<f32> = Vector3::new(1.0, 1.0, 0.0);
        let tangent: Vector3<f32> = Vector3::new(1.0, -1.0, 0.0);
        assert!(normal.dot(&tangent).abs() < 1e-6);

        let world_tangent = m.transform_vector(&tangent);
        let world_normal = m.normal_matrix().transform_normal(&normal);
        assert!(world_normal.dot(&world_tangent).abs() < 1e-5);

        // the plain model matrix does not keep them perpendicular
        let naive = m.transform_vector(&normal);
        assert!(naive.dot(&world_tangent).abs() > 1e-2);
    }

    #[test]
    fn test_singular_normal_matrix_falls_back() {
        let m = Transform::identity().scale(1.0, 0.0, 1.0);
        assert_eq!(m.try_normal_matrix(), Err(SceneError::SingularMatrix));
        assert_eq!(m.normal_matrix(), Transform::identity());
    }

    #[test]
    fn test_mvp_matrix_order() {
        let model = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));
        let view = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 2.0, 2.0));
        let mvp = mvp_matrix(&model, &view, &Matrix4::identity());
        let p = mvp.transform_point(&Point3::origin());
        assert!((p - Point3::new(2.0, 0.0, 0.0)).norm() < 1e-6);
    }
}
