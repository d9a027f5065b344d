// Point-in-time observations pushed over /ws/metrics

use serde::{Deserialize, Serialize};

use super::ResourceDescriptor;

/// Server status; serializes to uppercase JSON (e.g. "ONLINE").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceStatus {
    Online,
    Offline,
    Maintenance,
}

/// One tick's view of a resource. Superseded by the next snapshot with the same id.
///
/// Descriptor fields are flattened on the wire:
/// `{id, name, ipAddress, location, status, cpuLoad, memoryUsage}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    #[serde(flatten)]
    pub resource: ResourceDescriptor,
    pub status: ResourceStatus,
    /// Percentage, 0-100.
    pub cpu_load: f64,
    /// Percentage, 0-100.
    pub memory_usage: f64,
}

impl MetricSnapshot {
    pub fn new(
        resource: ResourceDescriptor,
        status: ResourceStatus,
        cpu_load: f64,
        memory_usage: f64,
    ) -> Self {
        Self {
            resource,
            status,
            cpu_load,
            memory_usage,
        }
    }

    pub fn id(&self) -> &str {
        &self.resource.id
    }

    pub fn name(&self) -> &str {
        &self.resource.name
    }
}
