//! Telemetry helpers for hosts embedding `chart-pipeline`.
//!
//! Every element logs through `tracing`; draw passes emit `debug`/`trace`
//! records naming the consistency states they service, and input
//! normalizations emit `warn`. Installing a subscriber stays the host's call:
//! either use one of the helpers below or wire your own filters.

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_DIRECTIVES: &str = "info";

/// Initializes a compact `tracing` subscriber filtered by `RUST_LOG`, falling
/// back to [`DEFAULT_DIRECTIVES`].
///
/// Returns `false` when the `telemetry` feature is disabled or a global
/// subscriber was already installed by the host application.
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing_with_fallback(DEFAULT_DIRECTIVES)
}

/// Same as [`init_default_tracing`] with a caller-provided fallback filter,
/// e.g. `"chart_pipeline=debug"` to trace draw passes.
#[must_use]
pub fn init_tracing_with_fallback(fallback_directives: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback_directives));
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = fallback_directives;
        false
    }
}
