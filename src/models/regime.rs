//! Agent regime (policy thresholds).
//!
//! A regime bundles the per-agent quotas used by the rest and service-day
//! rules. Every field is optional; unset fields resolve to the system
//! default through the `effective_*` accessors or [`Regime::resolve`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// System-wide defaults applied when a regime (or one of its fields) is absent.
pub mod defaults {
    /// Minimum rest days in a calendar year.
    pub const MIN_ANNUAL_REST_DAYS: u32 = 114;
    /// Minimum rest days falling on a Sunday in a calendar year.
    pub const MIN_REST_SUNDAYS: u32 = 22;
    /// Minimum rest days in a calendar semester.
    pub const MIN_SEMESTER_REST_DAYS: u32 = 56;
    /// Minimum rest days in a calendar month.
    pub const MIN_MONTHLY_REST_DAYS: u32 = 8;
    /// Minimum weekend rest blocks (Sat→Sun or Sun→Mon) in a calendar year.
    pub const MIN_WEEKEND_REST_PAIRS: u32 = 12;
    /// Target average worked minutes per service day.
    pub const TARGET_SERVICE_MINUTES: u32 = 468;
    /// Allowed deviation around the target average.
    pub const SERVICE_TOLERANCE_MINUTES: u32 = 30;
}

/// Per-agent policy record with optional fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Regime {
    /// Regime identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub min_annual_rest_days: Option<u32>,
    pub min_rest_sundays: Option<u32>,
    pub min_semester_rest_days: Option<u32>,
    pub min_monthly_rest_days: Option<u32>,
    /// Minimum WERP blocks per year.
    pub min_weekend_rest_pairs: Option<u32>,
    pub target_service_minutes: Option<u32>,
    pub service_tolerance_minutes: Option<u32>,
}

/// Fully resolved thresholds of a regime.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct EffectiveRegime {
    pub min_annual_rest_days: u32,
    pub min_rest_sundays: u32,
    pub min_semester_rest_days: u32,
    pub min_monthly_rest_days: u32,
    pub min_weekend_rest_pairs: u32,
    pub target_service_minutes: u32,
    pub service_tolerance_minutes: u32,
}

impl Default for EffectiveRegime {
    fn default() -> Self {
        Regime::resolve(None)
    }
}

impl Regime {
    /// Creates an empty regime (all fields use defaults).
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Loads a regime from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the annual rest-day minimum.
    pub fn with_min_annual_rest_days(mut self, days: u32) -> Self {
        self.min_annual_rest_days = Some(days);
        self
    }

    /// Sets the rest-Sunday minimum.
    pub fn with_min_rest_sundays(mut self, days: u32) -> Self {
        self.min_rest_sundays = Some(days);
        self
    }

    /// Sets the semester rest-day minimum.
    pub fn with_min_semester_rest_days(mut self, days: u32) -> Self {
        self.min_semester_rest_days = Some(days);
        self
    }

    /// Sets the monthly rest-day minimum.
    pub fn with_min_monthly_rest_days(mut self, days: u32) -> Self {
        self.min_monthly_rest_days = Some(days);
        self
    }

    /// Sets the weekend rest-pair minimum.
    pub fn with_min_weekend_rest_pairs(mut self, pairs: u32) -> Self {
        self.min_weekend_rest_pairs = Some(pairs);
        self
    }

    /// Sets the service-day average target and tolerance.
    pub fn with_service_target(mut self, minutes: u32, tolerance: u32) -> Self {
        self.target_service_minutes = Some(minutes);
        self.service_tolerance_minutes = Some(tolerance);
        self
    }

    pub fn effective_min_annual_rest_days(&self) -> u32 {
        self.min_annual_rest_days
            .unwrap_or(defaults::MIN_ANNUAL_REST_DAYS)
    }

    pub fn effective_min_rest_sundays(&self) -> u32 {
        self.min_rest_sundays.unwrap_or(defaults::MIN_REST_SUNDAYS)
    }

    pub fn effective_min_semester_rest_days(&self) -> u32 {
        self.min_semester_rest_days
            .unwrap_or(defaults::MIN_SEMESTER_REST_DAYS)
    }

    pub fn effective_min_monthly_rest_days(&self) -> u32 {
        self.min_monthly_rest_days
            .unwrap_or(defaults::MIN_MONTHLY_REST_DAYS)
    }

    pub fn effective_min_weekend_rest_pairs(&self) -> u32 {
        self.min_weekend_rest_pairs
            .unwrap_or(defaults::MIN_WEEKEND_REST_PAIRS)
    }

    pub fn effective_target_service_minutes(&self) -> u32 {
        self.target_service_minutes
            .unwrap_or(defaults::TARGET_SERVICE_MINUTES)
    }

    pub fn effective_service_tolerance_minutes(&self) -> u32 {
        self.service_tolerance_minutes
            .unwrap_or(defaults::SERVICE_TOLERANCE_MINUTES)
    }

    /// Resolves an optional regime into concrete thresholds.
    ///
    /// `None` yields the system defaults for every field.
    pub fn resolve(regime: Option<&Regime>) -> EffectiveRegime {
        let fallback = Regime::default();
        let r = regime.unwrap_or(&fallback);
        EffectiveRegime {
            min_annual_rest_days: r.effective_min_annual_rest_days(),
            min_rest_sundays: r.effective_min_rest_sundays(),
            min_semester_rest_days: r.effective_min_semester_rest_days(),
            min_monthly_rest_days: r.effective_min_monthly_rest_days(),
            min_weekend_rest_pairs: r.effective_min_weekend_rest_pairs(),
            target_service_minutes: r.effective_target_service_minutes(),
            service_tolerance_minutes: r.effective_service_tolerance_minutes(),
        }
    }

    /// Rejects values no rule can satisfy.
    pub fn validate(&self) -> Result<()> {
        let eff = Regime::resolve(Some(self));
        if eff.min_annual_rest_days > 366 {
            return Err(Error::Config(format!(
                "regime '{}': min_annual_rest_days {} exceeds a year",
                self.id, eff.min_annual_rest_days
            )));
        }
        if eff.min_semester_rest_days > 184 {
            return Err(Error::Config(format!(
                "regime '{}': min_semester_rest_days {} exceeds a semester",
                self.id, eff.min_semester_rest_days
            )));
        }
        if eff.min_monthly_rest_days > 31 {
            return Err(Error::Config(format!(
                "regime '{}': min_monthly_rest_days {} exceeds a month",
                self.id, eff.min_monthly_rest_days
            )));
        }
        if eff.service_tolerance_minutes > eff.target_service_minutes {
            return Err(Error::Config(format!(
                "regime '{}': service tolerance {} exceeds target {}",
                self.id, eff.service_tolerance_minutes, eff.target_service_minutes
            )));
        }
        Ok(())
    }
}
