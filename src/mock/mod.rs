// Stand-in backend: fixture fleet, random metric generator and an axum server exposing both endpoints

mod fleet;
mod generator;
pub mod server;

pub use fleet::default_fleet;
pub use generator::MetricGenerator;
