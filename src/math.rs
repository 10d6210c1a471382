use std::f32::consts::PI;

use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::{Result, TraceError};

pub fn degrees_to_rad(angle: f32) -> f32 {
    angle * PI / 180.0
}

pub fn rad_to_degrees(angle: f32) -> f32 {
    angle * 180.0 / PI
}

/// 카메라 위치와 바라보는 지점으로 뷰 행렬을 만듦.
///
/// nalgebra는 열 벡터를 쓰기 때문에 (`M * v`) 각 축이 행에 들어가고 이동값이 마지막 열에 들어감.
/// `up`은 바라보는 방향과 평행하면 안 됨. 평행하면 기저가 정의되지 않음.
pub fn create_look_at(
    position: &Point3<f32>,
    target: &Point3<f32>,
    up: &Vector3<f32>,
) -> Matrix4<f32> {
    let forward = (target - position).normalize();
    let right = up.cross(&forward).normalize();
    let true_up = forward.cross(&right).normalize();

    let eye = position.coords;

    #[rustfmt::skip]
    let view = Matrix4::new(
        right.x,   right.y,   right.z,   -right.dot(&eye),
        true_up.x, true_up.y, true_up.z, -true_up.dot(&eye),
        forward.x, forward.y, forward.z, -forward.dot(&eye),
        0.0,       0.0,       0.0,       1.0,
    );
    view
}

/// 원근 투영 행렬. far plane 없이 near plane 거리만 w 계산에 넣음.
/// 래스터화용이 아니라 NDC 좌표를 레이로 되돌릴 때만 씀.
pub fn create_perspective_fov(
    vertical_fov: f32,
    aspect_ratio: f32,
    near_plane_distance: f32,
) -> Matrix4<f32> {
    let height = 1.0 / (vertical_fov / 2.0).tan();

    #[rustfmt::skip]
    let projection = Matrix4::new(
        height / aspect_ratio, 0.0,    0.0, 0.0,
        0.0,                   height, 0.0, 0.0,
        0.0,                   0.0,    0.0, near_plane_distance,
        0.0,                   0.0,    1.0, 0.0,
    );
    projection
}

/// 역행렬을 구하지 못하면 단위 행렬로 대체하지 않고 바로 에러를 돌려줌
pub fn invert(matrix: &Matrix4<f32>, name: &'static str) -> Result<Matrix4<f32>> {
    match matrix.try_inverse() {
        Some(inverse) if inverse.iter().all(|value| value.is_finite()) => Ok(inverse),
        _ => Err(TraceError::SingularMatrix(name)),
    }
}

/// `normal`은 정규화하지 않은 그대로 사용함 (거칠기 때문에 길이가 1이 아닐 수 있음)
pub fn reflect(direction: &Vector3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    direction - normal * (2.0 * direction.dot(normal))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn converts_degrees_to_radians() {
        assert_relative_eq!(degrees_to_rad(0.0), 0.0);
        assert_relative_eq!(degrees_to_rad(1.0), 0.0175, epsilon = 1e-4);
        assert_relative_eq!(degrees_to_rad(45.0), 0.7854, epsilon = 1e-4);
        assert_relative_eq!(degrees_to_rad(180.0), 3.1416, epsilon = 1e-4);
    }

    #[test]
    fn converts_radians_to_degrees() {
        assert_relative_eq!(rad_to_degrees(0.0), 0.0);
        assert_relative_eq!(rad_to_degrees(1.0), 57.2958, epsilon = 1e-3);
        assert_relative_eq!(rad_to_degrees(3.1416), 180.0004, epsilon = 1e-3);
    }

    #[test]
    fn look_at_uses_orthonormal_basis() {
        let position = Point3::new(3.0, 15.0, -6.5);
        let target = Point3::new(1.0, 0.5, 7.8);
        let up = Vector3::y();

        let view = create_look_at(&position, &target, &up);

        let forward = (target - position).normalize();
        let right = up.cross(&forward).normalize();
        let true_up = forward.cross(&right).normalize();

        for column in 0..3 {
            assert_eq!(view[(0, column)], right[column]);
            assert_eq!(view[(1, column)], true_up[column]);
            assert_eq!(view[(2, column)], forward[column]);
            assert_eq!(view[(3, column)], 0.0);
        }
        assert_eq!(view[(0, 3)], -right.dot(&position.coords));
        assert_eq!(view[(1, 3)], -true_up.dot(&position.coords));
        assert_eq!(view[(2, 3)], -forward.dot(&position.coords));
        assert_eq!(view[(3, 3)], 1.0);
    }

    #[test]
    fn look_at_moves_camera_to_origin() {
        let position = Point3::new(0.0, 0.0, -3.0);
        let view = create_look_at(&position, &Point3::new(0.0, 0.0, 1.0), &Vector3::y());

        let transformed = view.transform_point(&position);
        assert_relative_eq!(transformed, Point3::origin(), epsilon = 1e-6);
    }

    #[test]
    fn perspective_encodes_near_plane_in_w() {
        let fov = 0.78;
        let aspect_ratio = 1.3;
        let near = 0.01;

        let projection = create_perspective_fov(fov, aspect_ratio, near);
        let height = 1.0 / (fov / 2.0).tan();

        assert_eq!(projection[(0, 0)], height / aspect_ratio);
        assert_eq!(projection[(1, 1)], height);
        assert_eq!(projection[(2, 2)], 0.0);
        assert_eq!(projection[(2, 3)], near);
        assert_eq!(projection[(3, 2)], 1.0);
        assert_eq!(projection[(3, 3)], 0.0);
    }

    #[test]
    fn invert_rejects_singular_matrix() {
        let projection = create_perspective_fov(degrees_to_rad(45.0), 1.0, 0.0);

        assert_eq!(
            invert(&projection, "projection"),
            Err(TraceError::SingularMatrix("projection"))
        );
    }

    #[test]
    fn invert_round_trips_projection() {
        let projection = create_perspective_fov(degrees_to_rad(45.0), 16.0 / 9.0, 0.1);
        let inverse = invert(&projection, "projection").unwrap();

        assert_relative_eq!(projection * inverse, Matrix4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn reflect_mirrors_around_normal() {
        let reflected = reflect(&Vector3::new(1.0, -1.0, 0.0), &Vector3::y());
        assert_eq!(reflected, Vector3::new(1.0, 1.0, 0.0));
    }
}
