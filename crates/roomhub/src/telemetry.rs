//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing-subscriber` fmt subscriber as the global default.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` is used (for
/// example `HubConfig::log_filter`). Returns `false` if a global
/// subscriber was already installed, so calling this more than once is
/// harmless.
pub fn init(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_second_call_returns_false() {
        init("warn");
        assert!(!init("warn"));
    }
}
