use chrono::{DateTime, Utc};

use crate::constants::{LUNAR_EPOCH_UNIX, LUNAR_PERIOD_SECS};

/// The eight principal lunar phases, in cyclic order, plus a sentinel
/// for a slice index outside the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoonPhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
    Unknown,
}

impl MoonPhase {
    /// Returns the phase of the moon at the given instant.
    ///
    /// Divides the lunar cycle since the reference new moon into eight
    /// equal slices. Instants before the epoch wrap around via
    /// `rem_euclid`, so every real instant maps to a named phase;
    /// `Unknown` exists only as an explicit fallback and is never an
    /// error.
    pub fn at(instant: DateTime<Utc>) -> Self {
        let elapsed = (instant.timestamp() - LUNAR_EPOCH_UNIX).rem_euclid(LUNAR_PERIOD_SECS);
        match elapsed * 8 / LUNAR_PERIOD_SECS {
            0 => Self::New,
            1 => Self::WaxingCrescent,
            2 => Self::FirstQuarter,
            3 => Self::WaxingGibbous,
            4 => Self::Full,
            5 => Self::WaningGibbous,
            6 => Self::LastQuarter,
            7 => Self::WaningCrescent,
            _ => Self::Unknown,
        }
    }

    /// Human-readable phase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::New => "New Moon",
            Self::WaxingCrescent => "Waxing Crescent",
            Self::FirstQuarter => "First Quarter",
            Self::WaxingGibbous => "Waxing Gibbous",
            Self::Full => "Full Moon",
            Self::WaningGibbous => "Waning Gibbous",
            Self::LastQuarter => "Last Quarter",
            Self::WaningCrescent => "Waning Crescent",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
