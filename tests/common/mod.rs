#[macro_use]
pub mod macros;

use diploid_core::config::{FailurePolicy, PoolConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

#[allow(dead_code)]
pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

#[allow(dead_code)]
pub fn pool(workers: usize) -> PoolConfig {
    PoolConfig {
        workers: Some(workers),
        reserved_cores: 0,
        failure_policy: FailurePolicy::Abort,
    }
}

/// Fresh per-test directory under the system temp dir.
#[allow(dead_code)]
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("diploid_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}

/// Hand-rolled elementary update with every gate open.
#[allow(dead_code)]
pub fn reference_step(state: &[u8], rule: u8) -> Vec<u8> {
    let n = state.len();
    (0..n)
        .map(|i| {
            let left = state[(i + n - 1) % n];
            let center = state[i];
            let right = state[(i + 1) % n];
            let code = (left << 2) | (center << 1) | right;
            (rule >> code) & 1
        })
        .collect()
}
