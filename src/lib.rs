// Library for the binary and the integration tests

pub mod config;
pub mod directory;
pub mod endpoints;
pub mod error;
pub mod feed;
pub mod mock;
pub mod models;
pub mod presentation;
pub mod reconciler;
pub mod stream;
pub mod transport;
pub mod version;
