use crate::models::ResourceDescriptor;

/// The four demo servers served by the mock directory and streamed by the mock feeds.
pub fn default_fleet() -> Vec<ResourceDescriptor> {
    vec![
        ResourceDescriptor::new("srv-db-01", "Database Server 1", "192.168.1.10", "us-east-1"),
        ResourceDescriptor::new("srv-web-01", "Web Server Alpha", "10.0.0.5", "eu-west-2"),
        ResourceDescriptor::new("srv-cache-01", "Redis Cache", "172.16.0.20", "ap-southeast-1"),
        ResourceDescriptor::new("srv-worker-01", "Background Worker", "192.168.2.30", "us-west-2"),
    ]
}
