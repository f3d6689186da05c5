use {crate::series::TimeSeries, std::fmt};

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn as_array(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Observed tide gauge station with its measured series
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeRecord {
    /// Label from the metadata table
    pub station_id: String,
    /// Numeric identifier shared with the model sources
    pub gauge_no: u32,
    pub location: GeoLocation,
    /// Nominal sensor depth in metres
    pub depth: f64,
    pub series: TimeSeries,
    /// Line of the metadata table the station was read from
    pub line: usize,
}
