// Random metric snapshots for the simulated stream and the mock server

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{MetricSnapshot, ResourceDescriptor, ResourceStatus};

/// Three in five draws are ONLINE.
const STATUS_DRAW: [ResourceStatus; 5] = [
    ResourceStatus::Online,
    ResourceStatus::Online,
    ResourceStatus::Online,
    ResourceStatus::Maintenance,
    ResourceStatus::Offline,
];

pub struct MetricGenerator {
    rng: StdRng,
}

impl Default for MetricGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic sequence, for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Gauges are zero unless the server is ONLINE (cpu 10-99, memory 15-99).
    pub fn snapshot(&mut self, server: &ResourceDescriptor) -> MetricSnapshot {
        let status = STATUS_DRAW[self.rng.random_range(0..STATUS_DRAW.len())];
        let (cpu_load, memory_usage) = match status {
            ResourceStatus::Online => (
                self.rng.random_range(10..=99u32) as f64,
                self.rng.random_range(15..=99u32) as f64,
            ),
            _ => (0.0, 0.0),
        };
        MetricSnapshot::new(server.clone(), status, cpu_load, memory_usage)
    }

    pub fn batch(&mut self, fleet: &[ResourceDescriptor]) -> Vec<MetricSnapshot> {
        fleet.iter().map(|s| self.snapshot(s)).collect()
    }
}
