// Domain models shared by the directory client, the metrics stream and the mock backend

mod metrics;
mod resource;

pub use metrics::{MetricSnapshot, ResourceStatus};
pub use resource::ResourceDescriptor;
