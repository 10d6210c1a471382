use nalgebra::{Point3, Vector3};

use crate::error::{Result, TraceError};

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    // 여러 구가 같은 재질을 공유할 수 있음
    pub materials: Vec<Material>,
    // UI 같은 외부에서 장면을 바꾸면 true로 설정. 누적 렌더링을 다시 시작할 때 씀
    pub has_changed: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            spheres: vec![],
            materials: vec![],
            has_changed: false,
        }
    }

    /// 분홍색 구 하나와 바닥 역할을 하는 커다란 파란 구
    pub fn demo() -> Self {
        Self {
            spheres: vec![
                Sphere {
                    position: Point3::origin(),
                    radius: 1.0,
                    material_index: 0,
                },
                Sphere {
                    position: Point3::new(0.0, -101.0, 0.0),
                    radius: 100.0,
                    material_index: 1,
                },
            ],
            materials: vec![
                Material {
                    albedo: Vector3::new(1.0, 0.0, 1.0),
                    roughness: 0.0,
                    ..Default::default()
                },
                Material {
                    albedo: Vector3::new(0.2, 0.3, 1.0),
                    roughness: 0.1,
                    ..Default::default()
                },
            ],
            has_changed: false,
        }
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.has_changed = true;
        self.materials.len() - 1
    }

    pub fn add_sphere(&mut self, sphere: Sphere) -> usize {
        self.spheres.push(sphere);
        self.has_changed = true;
        self.spheres.len() - 1
    }

    pub fn material(&self, sphere: &Sphere) -> &Material {
        &self.materials[sphere.material_index]
    }

    /// 렌더링 시작 전에 모든 구의 재질 인덱스가 유효한지 확인
    pub fn validate(&self) -> Result<()> {
        let count = self.materials.len();
        match self
            .spheres
            .iter()
            .position(|sphere| sphere.material_index >= count)
        {
            Some(sphere) => Err(TraceError::MissingMaterial {
                sphere,
                index: self.spheres[sphere].material_index,
                count,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub position: Point3<f32>,
    pub radius: f32,
    pub material_index: usize,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            radius: 0.5,
            material_index: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub albedo: Vector3<f32>,
    pub roughness: f32,
    pub metallic: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vector3::new(1.0, 1.0, 1.0),
            roughness: 1.0,
            metallic: 0.0,
        }
    }
}
