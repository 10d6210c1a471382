use std::time::{SystemTime, UNIX_EPOCH};

use nalgebra::Vector3;
use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Seed {
    // 렌더링할 때마다 시간으로 시드를 정함
    #[default]
    Entropy,
    Fixed(u64),
}

const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

impl Seed {
    /// 렌더링 패스마다 다른 시드. 고정 시드여도 누적할 때 같은 노이즈가 반복되지 않음
    pub fn resolve(self, pass: u64) -> u64 {
        match self {
            Seed::Fixed(seed) => seed.wrapping_add(pass.wrapping_mul(SEED_MIX)),
            Seed::Entropy => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or_default(),
        }
    }
}

pub fn random_vec<T, R>(rng: &mut impl Rng, range: R) -> Vector3<T>
where
    T: SampleUniform + nalgebra::Scalar,
    R: SampleRange<T> + Clone,
{
    Vector3::new(
        rng.gen_range(range.clone()),
        rng.gen_range(range.clone()),
        rng.gen_range(range),
    )
}

/// 반사 방향을 흩뜨릴 때 쓰는 난수 생성기. 워커(행)마다 하나씩 만들어서 씀
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    rng: StdRng,
}

impl RandomGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 같은 렌더링 안에서도 워커마다 다른 수열이 나오도록 시드를 섞음
    pub fn for_worker(run_seed: u64, worker: u64) -> Self {
        Self::new(run_seed ^ worker.wrapping_add(1).wrapping_mul(SEED_MIX))
    }

    /// 각 성분이 [-0.5, 0.5) 범위
    pub fn vector3(&mut self) -> Vector3<f32> {
        random_vec(&mut self.rng, -0.5..0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_stay_in_half_unit_range() {
        let mut generator = RandomGenerator::new(42);

        for _ in 0..1000 {
            let vector = generator.vector3();
            assert!(vector.iter().all(|value| (-0.5..0.5).contains(value)));
        }
    }

    #[test]
    fn same_seed_repeats_sequence() {
        let mut first = RandomGenerator::for_worker(7, 3);
        let mut second = RandomGenerator::for_worker(7, 3);

        for _ in 0..16 {
            assert_eq!(first.vector3(), second.vector3());
        }
    }

    #[test]
    fn workers_get_different_sequences() {
        let mut first = RandomGenerator::for_worker(7, 0);
        let mut second = RandomGenerator::for_worker(7, 1);

        assert_ne!(first.vector3(), second.vector3());
    }

    #[test]
    fn fixed_seed_changes_per_pass() {
        assert_eq!(Seed::Fixed(99).resolve(0), 99);
        assert_eq!(Seed::Fixed(99).resolve(3), Seed::Fixed(99).resolve(3));
        assert_ne!(Seed::Fixed(99).resolve(1), 99);
        assert_eq!(Seed::default(), Seed::Entropy);
    }
}
