#![deny(missing_docs)]
//! Logging for the marketplace workspace.
//!
//! Every `market_*` macro stamps its message with the UI frame that was
//! current when the line was logged. The frame is process-wide, so engine
//! threads and the UI loop share one counter and their lines can be lined up.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[doc(hidden)]
pub use log;

static FRAME: AtomicU64 = AtomicU64::new(0);

/// Records the frame the UI loop last rendered.
/// The app driver calls this once per `Tick` message.
pub fn set_frame(tick: u64) {
    FRAME.store(tick, Ordering::Relaxed);
}

/// The last frame recorded by `set_frame`, or 0 before the first tick.
pub fn frame() -> u64 {
    FRAME.load(Ordering::Relaxed)
}

/// A message prefixed with the frame it was logged in.
#[doc(hidden)]
pub struct Stamped<'a> {
    frame: u64,
    message: fmt::Arguments<'a>,
}

impl<'a> Stamped<'a> {
    #[doc(hidden)]
    pub fn new(message: fmt::Arguments<'a>) -> Self {
        Self {
            frame: frame(),
            message,
        }
    }
}

impl fmt::Display for Stamped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[frame {}] {}", self.frame, self.message)
    }
}

/// Logs a trace-level message stamped with the current frame.
#[macro_export]
macro_rules! market_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!("{}", $crate::Stamped::new(format_args!($($arg)*)));
    }};
}

/// Logs a debug-level message stamped with the current frame.
#[macro_export]
macro_rules! market_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!("{}", $crate::Stamped::new(format_args!($($arg)*)));
    }};
}

/// Logs an info-level message stamped with the current frame.
#[macro_export]
macro_rules! market_info {
    ($($arg:tt)*) => {{
        $crate::log::info!("{}", $crate::Stamped::new(format_args!($($arg)*)));
    }};
}

/// Logs a warn-level message stamped with the current frame.
#[macro_export]
macro_rules! market_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!("{}", $crate::Stamped::new(format_args!($($arg)*)));
    }};
}

/// Logs an error-level message stamped with the current frame.
#[macro_export]
macro_rules! market_error {
    ($($arg:tt)*) => {{
        $crate::log::error!("{}", $crate::Stamped::new(format_args!($($arg)*)));
    }};
}

/// Terminal logger for tests. No-ops if a logger is already installed.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    // Engine work runs on runtime worker threads; name them in test output.
    let config = ConfigBuilder::new()
        .set_thread_level(log::LevelFilter::Error)
        .set_thread_mode(simplelog::ThreadLogMode::Names)
        .build();

    let _ = TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto);
}

#[cfg(test)]
mod tests {
    use super::{frame, set_frame, Stamped};

    #[test]
    fn frame_is_shared_across_threads_and_stamps_messages() {
        set_frame(7);
        let seen = std::thread::spawn(frame).join().unwrap();
        assert_eq!(seen, 7);

        let post = "p1";
        let line = Stamped::new(format_args!("like on {post} confirmed ({} ms)", 12)).to_string();
        assert_eq!(line, "[frame 7] like on p1 confirmed (12 ms)");

        market_info!("logged at frame {}", frame());
    }
}
