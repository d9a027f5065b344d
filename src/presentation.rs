// Display models: a pure projection of connection state, reconciled metrics and the
// directory view. No I/O here; the binary prints the Display impls.

use std::fmt;

use crate::directory::DirectoryView;
use crate::models::{MetricSnapshot, ResourceDescriptor, ResourceStatus};
use crate::stream::ConnectionState;

pub const CRITICAL_THRESHOLD: f64 = 85.0;
pub const WARNING_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Nominal,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Nominal => "nominal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// `> 85` critical, `> 60` warning, anything else nominal.
pub fn gauge_tier(value: f64) -> Severity {
    if value > CRITICAL_THRESHOLD {
        Severity::Critical
    } else if value > WARNING_THRESHOLD {
        Severity::Warning
    } else {
        Severity::Nominal
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub severity: Severity,
}

pub fn status_badge(status: ResourceStatus) -> StatusBadge {
    match status {
        ResourceStatus::Online => StatusBadge {
            label: "Online",
            severity: Severity::Nominal,
        },
        ResourceStatus::Offline => StatusBadge {
            label: "Offline",
            severity: Severity::Critical,
        },
        ResourceStatus::Maintenance => StatusBadge {
            label: "Maintenance",
            severity: Severity::Warning,
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub label: &'static str,
    pub value: f64,
    /// Bar width in percent, clamped to 0..=100.
    pub fill_percent: f64,
    pub tier: Severity,
}

impl Gauge {
    pub fn new(label: &'static str, value: f64) -> Self {
        Self {
            label,
            value,
            fill_percent: value.clamp(0.0, 100.0),
            tier: gauge_tier(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerCard {
    pub id: String,
    pub name: String,
    pub ip_address: String,
    pub status: StatusBadge,
    pub cpu: Gauge,
    pub memory: Gauge,
}

impl From<&MetricSnapshot> for ServerCard {
    fn from(m: &MetricSnapshot) -> Self {
        ServerCard {
            id: m.resource.id.clone(),
            name: m.resource.name.clone(),
            ip_address: m.resource.ip_address.clone(),
            status: status_badge(m.status),
            cpu: Gauge::new("CPU Load", m.cpu_load),
            memory: Gauge::new("Memory", m.memory_usage),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardModel {
    pub connection_label: &'static str,
    pub connection_severity: Severity,
    pub can_connect: bool,
    pub can_disconnect: bool,
    /// Shown instead of cards when there is nothing to list.
    pub placeholder: Option<&'static str>,
    pub cards: Vec<ServerCard>,
}

/// Cards are only shown while connected; `metrics` is expected in display order.
pub fn render_dashboard(state: ConnectionState, metrics: &[MetricSnapshot]) -> DashboardModel {
    let (connection_label, connection_severity) = match state {
        ConnectionState::Disconnected => ("Disconnected", Severity::Critical),
        ConnectionState::Connecting => ("Connecting", Severity::Warning),
        ConnectionState::Connected => ("Connected", Severity::Nominal),
    };
    let (placeholder, cards) = match state {
        ConnectionState::Disconnected => (
            Some("Connect to the live feed to see real-time server metrics."),
            Vec::new(),
        ),
        ConnectionState::Connecting => (Some("Connecting..."), Vec::new()),
        ConnectionState::Connected if metrics.is_empty() => (Some("Waiting for data..."), Vec::new()),
        ConnectionState::Connected => (None, metrics.iter().map(ServerCard::from).collect()),
    };
    DashboardModel {
        connection_label,
        connection_severity,
        can_connect: state == ConnectionState::Disconnected,
        can_disconnect: state == ConnectionState::Connected,
        placeholder,
        cards,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryModel {
    NotFetched,
    Loading,
    Failed { message: String },
    Empty,
    Servers(Vec<ResourceDescriptor>),
}

pub fn render_directory(view: &DirectoryView) -> DirectoryModel {
    if view.is_loading {
        DirectoryModel::Loading
    } else if let Some(message) = &view.error {
        DirectoryModel::Failed {
            message: message.clone(),
        }
    } else if !view.has_fetched {
        DirectoryModel::NotFetched
    } else if view.servers.is_empty() {
        DirectoryModel::Empty
    } else {
        DirectoryModel::Servers(view.servers.clone())
    }
}

impl fmt::Display for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const WIDTH: usize = 20;
        let filled = ((self.fill_percent / 100.0) * WIDTH as f64).round() as usize;
        write!(
            f,
            "{:<9} [{}{}] {:>3}% {}",
            self.label,
            "#".repeat(filled),
            "-".repeat(WIDTH - filled),
            self.value,
            self.tier.as_str()
        )
    }
}

impl fmt::Display for DashboardModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Live metrics: {} ==", self.connection_label)?;
        if let Some(text) = self.placeholder {
            return writeln!(f, "  {}", text);
        }
        for card in &self.cards {
            writeln!(
                f,
                "  {} ({}) - {} [{}]",
                card.name,
                card.ip_address,
                card.status.label,
                card.status.severity.as_str()
            )?;
            writeln!(f, "    {}", card.cpu)?;
            writeln!(f, "    {}", card.memory)?;
        }
        Ok(())
    }
}

impl fmt::Display for DirectoryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Server directory ==")?;
        match self {
            DirectoryModel::NotFetched => writeln!(f, "  Click the button to fetch the server list."),
            DirectoryModel::Loading => writeln!(f, "  Fetching Data..."),
            DirectoryModel::Failed { message } => {
                writeln!(f, "  Failed to load data")?;
                writeln!(f, "  {}", message)
            }
            DirectoryModel::Empty => writeln!(f, "  No servers."),
            DirectoryModel::Servers(servers) => {
                for s in servers {
                    writeln!(f, "  {:<20} {:<15} {}", s.name, s.ip_address, s.location)?;
                }
                Ok(())
            }
        }
    }
}
