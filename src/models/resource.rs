// Static resource identity, as returned by GET /api/servers

use serde::{Deserialize, Serialize};

/// A managed server as issued by the directory. `id` is unique and stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub id: String,
    pub name: String,
    pub ip_address: String,
    pub location: String,
}

impl ResourceDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        ip_address: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ip_address: ip_address.into(),
            location: location.into(),
        }
    }
}
