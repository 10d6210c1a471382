use nalgebra::{Point3, Vector3};

use crate::error::{Result, TraceError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    origin: Point3<f32>,
    direction: Vector3<f32>,
}

impl Ray {
    /// 방향이 영벡터면 레이가 정의되지 않으니 만들지 않음
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Result<Self> {
        if direction == Vector3::zeros() {
            return Err(TraceError::InvalidArgument("ray direction must not be the zero vector"));
        }

        Ok(Self { origin, direction })
    }

    pub fn origin(&self) -> Point3<f32> {
        self.origin
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    pub fn point_at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}
