//! Abstracts tracing behind macros so logging can be compiled out per crate.
//!
//! The macros check the `log_*` features of the crate that *calls* them, so
//! every crate using them declares its own `log_info`, `log_warnings`,
//! `log_errors`, `log_debug` and `log_trace` features.
//! See similar: https://doc.rust-lang.org/src/std/macros.rs.html#138-145.

use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[doc(hidden)]
pub use tracing;

/// Installs a formatting subscriber as the global default.
///
/// # Errors
///
/// Returns [`SetGlobalDefaultError`] when a global subscriber was already set.
pub fn init(level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_thread_names(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => {
        if cfg!(feature="log_info") {
            $crate::tracing::info!($($t)*);
        } else {
			// do nothing;
        }
    };
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => {
        if cfg!(feature="log_warnings") {
            $crate::tracing::warn!($($t)*);
        } else {
			// do nothing;
        }
    };
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => {
        if cfg!(feature="log_debug") {
            $crate::tracing::debug!($($t)*);
        } else {
			// do nothing;
        }
    };
}

#[macro_export]
macro_rules! trace {
    ($($t:tt)*) => {
        if cfg!(feature="log_trace") {
            $crate::tracing::trace!($($t)*);
        } else {
			// do nothing;
        }
    };
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => {
        if cfg!(feature="log_errors") {
            $crate::tracing::error!($($t)*);
        } else {
			// do nothing;
        }
    };
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_logs_without_arg() {
        info!("worker started");
        debug!("worker started");
        trace!("worker started");
        warn!("worker started");
        error!("worker started");

        assert!(logs_contain("worker started"));
    }

    #[test]
    #[traced_test]
    fn test_logs_with_fields() {
        let worker = 3;
        info!(worker, "produced: {}", 42);
        error!(worker, "failed to write: {}", "disk full");

        assert!(logs_contain("produced: 42"));
        assert!(logs_contain("failed to write: disk full"));
    }
}
