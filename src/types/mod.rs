//! Core types returned to clients.
//!
//! Everything in this module is a stable, serializable view computed from raw upstream
//! records. The serde field names match what the telemetry frontend consumes.
//!
//! ## Overview
//!
//! - [`SessionKey`] identifies a session and keys the session cache
//! - [`DriverRef`] pairs a driver code with a display name
//! - [`LapSummary`] is one normalized lap
//! - [`TelemetryTrace`] holds sanitized [`TelemetrySample`] rows for one lap, with a
//!   [`TelemetryColumns`] projection
//! - [`EventScheduleEntry`] is one event of a season
//!
//! ## JSON Safety
//!
//! No type here can carry NaN or infinite values once produced by the normalizers, so all
//! of them serialize to plain JSON numbers.
//!
//! ```rust
//! use pitlane::types::{DriverRef, SessionKey};
//!
//! let key = SessionKey::new(2023, "Bahrain Grand Prix", "R").unwrap();
//! assert_eq!(key.year(), 2023);
//!
//! let driver = DriverRef::new("VER", Some("Max Verstappen".to_string()));
//! assert!(driver.has_full_name());
//! ```

mod driver;
mod event;
mod lap;
mod session_key;
mod telemetry;

pub use driver::DriverRef;
pub use event::EventScheduleEntry;
pub use lap::LapSummary;
pub use session_key::{FIRST_SUPPORTED_YEAR, SessionKey};
pub use telemetry::{TelemetryColumns, TelemetrySample, TelemetryTrace};
