//! Labor-time compliance engine for shift rosters.
//!
//! Checks one agent's day-by-day roster against working-time regulations:
//! daily rest, daily duration and amplitude, consecutive work periods, the
//! double rest that must follow a maximal work period, and regime-driven
//! rest, service and leave quotas over calendar months, semesters and years.
//!
//! # Modules
//!
//! - **`normalize`**: Raw planning records → `CanonicalDay` via an explicit
//!   day-type table
//! - **`models`**: Domain types: `CanonicalDay`, `TimeInterval`, `Regime`,
//!   `Violation`, `RuleResult`
//! - **`validation`**: Input integrity checks (agent, duplicate dates, intervals)
//! - **`periods`**: Work, rest and leave block detection with truncation flags
//! - **`windowing`**: Calendar sub-periods and scoped rule dispatch
//! - **`compliance`**: Rule catalog and the evaluation engine
//! - **`config`**: Named rule thresholds
//!
//! # Failure model
//!
//! Structural input errors fail fast before any rule runs. Everything after
//! that is data: rule breaches, undeterminable windows and rule failures all
//! come back as graded [`Violation`]s, and a roster is valid iff none of them
//! is an Error.
//!
//! # Example
//!
//! ```
//! use u_roster::compliance::{ComplianceEngine, WindowContext};
//! use u_roster::models::{codes, CanonicalDay};
//! use chrono::{Duration, NaiveDate, NaiveTime};
//!
//! let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
//! let mut days = vec![CanonicalDay::rest("A1", first)];
//! for i in 1..=6 {
//!     days.push(CanonicalDay::working("A1", first + Duration::days(i), t(8), t(16)));
//! }
//! days.push(CanonicalDay::rest("A1", first + Duration::days(7)));
//! days.push(CanonicalDay::rest("A1", first + Duration::days(8)));
//!
//! let window = WindowContext::new("A1", days).unwrap();
//! let report = ComplianceEngine::standard().evaluate(&window, None);
//! assert!(report.is_valid());
//! assert_eq!(report.result.with_code(codes::GPT_DOUBLE_REST_REQUIRED).count(), 1);
//! ```

pub mod compliance;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod periods;
pub mod validation;
pub mod windowing;

pub use compliance::{ComplianceEngine, ComplianceReport, ComplianceRule, WindowContext};
pub use config::RuleThresholds;
pub use error::{Error, Result, RuleError, StructuralError};
pub use models::{CanonicalDay, DayType, Regime, RuleResult, Severity, Violation};
