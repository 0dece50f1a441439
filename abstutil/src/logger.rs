use env_logger::{Builder, Env};

/// Intercept messages using the `log` crate and print them to STDERR, defaulting to `info`.
/// Respects `RUST_LOG` for anything finer-grained.
pub fn setup() {
    Builder::from_env(Env::default().default_filter_or("info")).init();
}
