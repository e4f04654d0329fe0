//! Logging and observability
//!
//! Structured logging with:
//! - Console output (always on)
//! - JSON-formatted rolling log files (optional)
//! - Configurable log levels
//!
//! Nothing logged here may contain a raw student identifier. Log contexts, tags,
//! counts, pseudonyms and field paths only.
//!
//! # Example
//!
//! ```no_run
//! use canvas_shield::logging::init_logging;
//! use canvas_shield::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Gateway started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the completion of a sanitize call
///
/// # Example
///
/// ```no_run
/// use canvas_shield::log_sanitize_complete;
/// use canvas_shield::domain::CourseIdentityContext;
/// use std::time::Duration;
///
/// let context = CourseIdentityContext::for_course("course-101").unwrap();
/// log_sanitize_complete!(&context, 4, 2, Duration::from_millis(3));
/// ```
#[macro_export]
macro_rules! log_sanitize_complete {
    ($context:expr, $replacements:expr, $individuals:expr, $duration:expr) => {
        tracing::info!(
            context = %$context,
            replacements = $replacements,
            individuals = $individuals,
            duration_ms = $duration.as_millis() as u64,
            "Sanitization completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use canvas_shield::log_error_with_context;
/// use canvas_shield::domain::ShieldError;
///
/// let error = ShieldError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::{CourseIdentityContext, ShieldError};
    use std::time::Duration;

    #[test]
    fn test_macros_expand_without_subscriber() {
        let context = CourseIdentityContext::for_course("course-101").unwrap();
        log_sanitize_complete!(&context, 4usize, 2usize, Duration::from_millis(3));

        let error = ShieldError::Validation("bad roster".to_string());
        log_error_with_context!(&error, "Roster import failed");
    }
}
