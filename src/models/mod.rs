//! Roster domain models.
//!
//! Provides the data types the compliance engine works on: canonical days
//! and their intervals, agent regimes, and the violation/result model.
//!
//! # Domain Mappings
//!
//! | u-roster | Railway planning | Hospital rota |
//! |----------|------------------|---------------|
//! | CanonicalDay | Journée agent | Shift day |
//! | DayType::Zcot | Présence forfaitaire | On-call presence |
//! | Regime | Régime de travail | Contract profile |
//! | Violation | Alerte | Compliance finding |

mod day;
mod regime;
mod violation;

pub use day::{CanonicalDay, DayType, NightWindow, TimeInterval};
pub use regime::{defaults, EffectiveRegime, Regime};
pub use violation::{codes, RuleResult, Severity, Violation};
