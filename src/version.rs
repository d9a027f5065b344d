// Crate identity baked in at build time; reported by the binary and the mock /version route

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const NAME: &str = env!("CARGO_PKG_NAME");
