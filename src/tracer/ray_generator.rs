use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};

use crate::camera::Camera;
use crate::error::{Result, TraceError};
use crate::math::{create_look_at, create_perspective_fov, degrees_to_rad, invert};
use crate::tracer::ray::Ray;

/// 카메라 하나당 한 번 만들어서 행렬들을 캐싱해 둠
#[derive(Debug, Clone)]
pub struct RayGenerator {
    position: Point3<f32>,
    view: Matrix4<f32>,
    inverse_view: Matrix4<f32>,
    projection: Matrix4<f32>,
    inverse_projection: Matrix4<f32>,
}

impl RayGenerator {
    pub fn new(camera: &Camera) -> Result<Self> {
        let projection = create_perspective_fov(
            degrees_to_rad(camera.vertical_fov),
            camera.aspect_ratio,
            camera.near_plane_distance,
        );
        let view = create_look_at(&camera.position, &camera.target, &Vector3::y());

        let inverse_projection = invert(&projection, "projection")?;
        let inverse_view = invert(&view, "view")?;

        Ok(Self {
            position: camera.position,
            view,
            inverse_view,
            projection,
            inverse_projection,
        })
    }

    pub fn view(&self) -> &Matrix4<f32> {
        &self.view
    }

    pub fn projection(&self) -> &Matrix4<f32> {
        &self.projection
    }

    /// `coord`는 [-1, 1] 범위의 NDC 좌표
    pub fn generate_ray(&self, coord: &Vector2<f32>) -> Result<Ray> {
        let range = -1.0..=1.0;
        if !range.contains(&coord.x) || !range.contains(&coord.y) {
            return Err(TraceError::OutOfRange(format!(
                "pixel coordinates ({}, {}) should be in the [-1, 1] range",
                coord.x, coord.y
            )));
        }

        let mut target = self.inverse_projection * Vector4::new(coord.x, coord.y, 1.0, 1.0);
        target /= target.w;

        // w = 0 으로 두어 방향 벡터로 변환 (이동값 무시)
        let direction = target.xyz().normalize().to_homogeneous();
        let world_direction = (self.inverse_view * direction).xyz().normalize();

        Ray::new(self.position, world_direction)
    }
}
