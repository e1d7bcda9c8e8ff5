//! Idle/output-rate watchdog used by the Process Manager to notice a
//! subprocess that has stopped producing output well before its hard
//! timeout fires.

pub mod watchdog;

pub use watchdog::{OutputWatchdog, WatchdogSnapshot};
