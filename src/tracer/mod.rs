use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::{debug, trace};
use nalgebra::{Point3, Vector2, Vector3, Vector4};
use rayon::prelude::*;

use crate::camera::Camera;
use crate::error::{Result, TraceError, WriteError};
use crate::math::reflect;
use crate::output::{Image, ImageWriter};
use crate::tracer::random::{RandomGenerator, Seed};
use crate::tracer::ray::Ray;
use crate::tracer::ray_generator::RayGenerator;
use crate::tracer::scene::{Scene, Sphere};

pub mod random;
pub mod ray;
pub mod ray_generator;
pub mod scene;

const BOUNCE_LIMIT: usize = 5;
const SKY_COLOR: [f32; 3] = [0.6, 0.7, 0.9];
// 정규화하지 않은 값 그대로 씀. 빛의 세기가 |light| 만큼 세짐
const LIGHT_DIRECTION: [f32; 3] = [1.0, -1.0, 1.0];
const BOUNCE_ATTENUATION: f32 = 0.4;
// 구 표면에서 바로 다음 레이를 쏘면 자기 자신과 다시 부딪히니 법선 방향으로 살짝 띄움
const SURFACE_BIAS: f32 = 0.0001;

// HitPayload는 빛의 경로에 대한 정보만 담고 색상은 나중에 계산함
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHitPayload {
    pub hit_distance: f32,
    pub world_position: Point3<f32>,
    pub world_normal: Vector3<f32>,
    pub object_index: usize,
}

/// 가까운 교점까지의 거리. 뒤에 있거나 만나지 않으면 None
///
/// 먼 쪽 근은 보지 않기 때문에 레이가 구 안에서 출발하면 교점을 못 찾음
pub fn intersect_sphere(ray: &Ray, sphere: &Sphere) -> Option<f32> {
    // 구가 원점에 있다고 가정하고 풀기 위해 레이 시작점을 옮김
    // (bx^2 + by^2 + bz^2) * t^2 + 2 * (ax * bx + ay * by + az * bz) * t + (ax^2 + ay^2 + az^2 - r^2) = 0
    let origin = ray.origin() - sphere.position;
    let direction = ray.direction();

    let a = direction.magnitude_squared();
    let b = 2.0 * origin.dot(&direction);
    let c = origin.magnitude_squared() - sphere.radius.powi(2);

    // 판별식
    let discriminant = b.powi(2) - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let distance = (-b - discriminant.sqrt()) / (2.0 * a);
    (distance > 0.0).then_some(distance)
}

/// 모든 구를 순서대로 검사해서 가장 가까운 교점을 찾음. 거리가 같으면 먼저 나온 구가 이김
pub fn trace_ray(ray: &Ray, scene: &Scene) -> Option<RayHitPayload> {
    let mut closest: Option<(usize, f32)> = None;

    for (index, sphere) in scene.spheres.iter().enumerate() {
        let Some(distance) = intersect_sphere(ray, sphere) else {
            continue;
        };

        match closest {
            Some((_, previous_distance)) if previous_distance <= distance => {}
            _ => closest = Some((index, distance)),
        }
    }

    closest.map(|(index, distance)| closest_hit(ray, distance, index, &scene.spheres[index]))
}

fn closest_hit(ray: &Ray, distance: f32, object_index: usize, sphere: &Sphere) -> RayHitPayload {
    let local_origin = ray.origin() - sphere.position;
    let local_position = local_origin + ray.direction() * distance;

    RayHitPayload {
        hit_distance: distance,
        world_position: sphere.position + local_position,
        world_normal: local_position.normalize(),
        object_index,
    }
}

/// 레이 하나를 최대 BOUNCE_LIMIT번 튕기면서 색을 모음
pub fn trace_path(mut ray: Ray, scene: &Scene, random: &mut RandomGenerator) -> Vector4<f32> {
    let sky = Vector3::from(SKY_COLOR);
    let light_direction = Vector3::from(LIGHT_DIRECTION);

    let mut color = Vector3::zeros();
    let mut multiplier = 1.0;

    for _ in 0..BOUNCE_LIMIT {
        let Some(payload) = trace_ray(&ray, scene) else {
            color += sky * multiplier;
            break;
        };

        let light = payload.world_normal.dot(&-light_direction).max(0.0);
        let material = scene.material(&scene.spheres[payload.object_index]);

        color += material.albedo * light * multiplier;
        multiplier *= BOUNCE_ATTENUATION;

        let origin = payload.world_position + payload.world_normal * SURFACE_BIAS;
        // 거칠기만큼 법선을 흔들어서 반사 방향을 흩뜨림. 거칠기 0이면 거울 반사
        let normal = payload.world_normal + random.vector3() * material.roughness;
        let direction = reflect(&ray.direction(), &normal);

        match Ray::new(origin, direction) {
            Ok(next) => ray = next,
            Err(_) => {
                trace!("bounce produced a zero direction at {:?}", origin);
                break;
            }
        }
    }

    Vector4::new(color.x, color.y, color.z, 1.0)
}

// DirectX의 RayGen 쉐이더와 같음
pub fn per_pixel(
    ray_generator: &RayGenerator,
    scene: &Scene,
    coord: &Vector2<f32>,
    random: &mut RandomGenerator,
) -> Result<Vector4<f32>> {
    let ray = ray_generator.generate_ray(coord)?;
    Ok(trace_path(ray, scene, random))
}

/// 픽셀 저장은 ImageWriter에게 맡기고 렌더러 자신은 이미지 상태를 갖지 않음
pub struct Renderer<W> {
    writer: W,
    seed: Seed,
    // 지금까지 그린 패스 수. 패스마다 난수 시드를 바꾸는 데 씀
    passes: AtomicU64,
}

impl<W: ImageWriter> Renderer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            seed: Seed::default(),
            passes: AtomicU64::new(0),
        }
    }

    /// 테스트에서 같은 결과를 얻고 싶을 때 시드를 고정함
    pub fn with_seed(self, seed: Seed) -> Self {
        Self { seed, ..self }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    /// 한 번의 완전한 패스를 그림. 누적은 이미지/매니저 쪽 책임
    pub fn render(&self, image: &W::Image, scene: &Scene, camera: &Camera) -> Result<()> {
        self.render_with_progress(image, scene, camera, |_| {})
    }

    /// `render`와 같지만 행 하나를 다 그릴 때마다 `on_row`를 부름 (순서는 보장하지 않음)
    pub fn render_with_progress<F>(
        &self,
        image: &W::Image,
        scene: &Scene,
        camera: &Camera,
        on_row: F,
    ) -> Result<()>
    where
        F: Fn(u32) + Sync,
    {
        let width = image.width();
        let height = image.height();

        if width == 0 || height == 0 {
            return Err(TraceError::OutOfRange(format!(
                "image size {}x{} must not be zero",
                width, height
            )));
        }

        scene.validate()?;
        let ray_generator = RayGenerator::new(camera)?;
        let pass = self.passes.fetch_add(1, Ordering::Relaxed);
        let run_seed = self.seed.resolve(pass);
        let started = Instant::now();

        // 각 행은 서로 독립적이니 행 단위로 병렬 처리
        (0..height).into_par_iter().try_for_each(|y| {
            let mut random = RandomGenerator::for_worker(run_seed, y as u64);

            for x in 0..width {
                let coord = Vector2::new(x as f32 / width as f32, y as f32 / height as f32) * 2.0
                    - Vector2::new(1.0, 1.0);

                let color = per_pixel(&ray_generator, scene, &coord, &mut random)?;
                self.writer.store_pixel(image, x, y, color);
            }

            on_row(y);
            Ok::<(), TraceError>(())
        })?;

        debug!(
            "rendered {}x{} ({} spheres) in {:?}",
            width,
            height,
            scene.spheres.len(),
            started.elapsed()
        );

        Ok(())
    }

    pub fn commit_image(
        &self,
        image: &W::Image,
        parameter: W::Parameter<'_>,
    ) -> std::result::Result<(), WriteError> {
        self.writer.commit_image(image, parameter)
    }
}
