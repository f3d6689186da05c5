use {
    crate::{error::GaugeError, series::TimeUnit, utils::days_to_seconds},
    chrono::NaiveDateTime,
    serde::Deserialize,
};

/// Landfall time and timestamp unit of one data source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceClock {
    /// Landfall in seconds since the source's epoch
    pub landfall: f64,
    pub unit: TimeUnit,
}

impl SourceClock {
    pub fn new(landfall: f64, unit: TimeUnit) -> Self {
        SourceClock { landfall, unit }
    }
}

/// Landfall instants of the three data sources
///
/// Each source counts time from its own zero point, so the same physical
/// landfall is described by a separate value per source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandfallReference {
    pub observed: SourceClock,
    pub simulated: SourceClock,
    pub reference: SourceClock,
}

/// Configured landfall of one source, given either as a calendar instant
/// measured from the epoch or as elapsed days
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceLandfall {
    #[serde(default)]
    pub instant: Option<NaiveDateTime>,
    #[serde(default)]
    pub elapsed_days: Option<f64>,
    pub unit: TimeUnit,
}

impl SourceLandfall {
    pub fn at(instant: NaiveDateTime, unit: TimeUnit) -> Self {
        SourceLandfall {
            instant: Some(instant),
            elapsed_days: None,
            unit,
        }
    }

    pub fn after_days(days: f64, unit: TimeUnit) -> Self {
        SourceLandfall {
            instant: None,
            elapsed_days: Some(days),
            unit,
        }
    }

    pub fn clock(&self, source_name: &str, epoch: NaiveDateTime) -> Result<SourceClock, GaugeError> {
        let invalid = |reason: &str| GaugeError::Landfall {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        };

        let landfall = match (self.instant, self.elapsed_days) {
            (Some(instant), None) => elapsed_seconds(epoch, instant),
            (None, Some(days)) => days_to_seconds(days),
            (Some(_), Some(_)) => return Err(invalid("both instant and elapsed_days given")),
            (None, None) => return Err(invalid("one of instant or elapsed_days is required")),
        };

        if !landfall.is_finite() {
            return Err(invalid("landfall is not finite"));
        }

        Ok(SourceClock::new(landfall, self.unit))
    }
}

/// Seconds from `epoch` to `instant`, including any sub-second part
pub fn elapsed_seconds(epoch: NaiveDateTime, instant: NaiveDateTime) -> f64 {
    let elapsed = instant - epoch;
    elapsed.num_milliseconds() as f64 / 1000.0
}
