//! Version information for the demo binary.

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Short version string, e.g. `"v0.1.0"`.
pub fn short_version() -> String {
    format!("v{VERSION}")
}
