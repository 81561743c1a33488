pub mod game;

// ============================================================================
// Profiling Macros
// ============================================================================

/// Log a profiling message when the `perf_stats` feature is enabled.
///
/// Used around the flow field recompute and other per-edit work. When the
/// feature is disabled this expands to nothing and the arguments are not
/// evaluated, so timing captures can sit behind the same feature gate:
///
/// ```ignore
/// #[cfg(feature = "perf_stats")]
/// let started = std::time::Instant::now();
/// // ... work ...
/// profile_log!("recompute took {:?}", started.elapsed());
/// ```
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($($arg:tt)*) => {
        bevy::prelude::info!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($($arg:tt)*) => {};
}
