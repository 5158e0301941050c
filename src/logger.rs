//! Structured logging with visual formatting.
//!
//! Provides mobihue's console output style: Unicode box-drawing characters
//! tie related messages into blocks, with semantic `[LEVEL]` macros for
//! warnings and errors. Logging can be disabled at runtime for quiet
//! operation during tests.
//!
//! ## Conventions
//!
//! - `log_version!` prints the startup header, once, at launch.
//! - `log_block_start!` opens a new conceptual block (a sync cycle, a
//!   shutdown phase); related follow-up lines use `log_decorated!` or
//!   `log_indented!`.
//! - `log_pipe!` inserts a single empty `┃` line before a warning or error
//!   that is not part of the surrounding block.
//! - `log_end!` prints the final `╹` terminator at shutdown.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

/// Main logging interface providing structured output formatting.
pub struct Log;

impl Log {
    /// Enable or disable logging temporarily.
    ///
    /// Useful for quiet operation during tests where log output would
    /// interfere with results.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }
}

/// Write formatted output to stdout (needed by macros).
pub fn write_output(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

// # Logging Macros

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣ {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┣ {expr}\n"));
        }
    }};
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┃   {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┃   {expr}\n"));
        }
    }};
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            $crate::logger::write_output("┃\n");
        }
    }};
}

/// Log a block start message, initiating a new conceptual block.
#[macro_export]
macro_rules! log_block_start {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┃\n┣ {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┃\n┣ {expr}\n"));
        }
    }};
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let version = env!("CARGO_PKG_VERSION");
            $crate::logger::write_output(&format!("┏ mobihue v{version} ━━╸\n"));
        }
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            $crate::logger::write_output("╹\n");
        }
    }};
}

/// Log a warning message with pipe prefix and yellow-colored text.
#[macro_export]
macro_rules! log_warning {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[33mWARNING\x1b[0m] {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┣[\x1b[33mWARNING\x1b[0m] {expr}\n"));
        }
    }};
}

/// Log an error message with pipe prefix and red-colored text.
#[macro_export]
macro_rules! log_error {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[31mERROR\x1b[0m] {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┣[\x1b[31mERROR\x1b[0m] {expr}\n"));
        }
    }};
}

/// Log an error message with a pipe prefix and terminal corner (standalone).
/// Used when the error ends the program flow.
#[macro_export]
macro_rules! log_error_exit {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┃\n┗[\x1b[31mERROR\x1b[0m] {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┃\n┗[\x1b[31mERROR\x1b[0m] {expr}\n"));
        }
    }};
}

/// Log an informational message with pipe prefix and green-colored text.
#[macro_export]
macro_rules! log_info {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[32mINFO\x1b[0m] {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┣[\x1b[32mINFO\x1b[0m] {expr}\n"));
        }
    }};
}

/// Log a debug/operational message with pipe prefix and green-colored text.
#[macro_export]
macro_rules! log_debug {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[32mDEBUG\x1b[0m] {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┣[\x1b[32mDEBUG\x1b[0m] {expr}\n"));
        }
    }};
}

/// Log a critical message with pipe prefix and red-colored text.
#[macro_export]
macro_rules! log_critical {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[31mCRITICAL\x1b[0m] {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┣[\x1b[31mCRITICAL\x1b[0m] {expr}\n"));
        }
    }};
}
