//! Observed tide gauge records.
//!
//! Stations are listed in a whitespace-delimited metadata table. Each row that
//! carries an `OK` status has a companion measurement file holding the
//! station's time and mean water level arrays.

use {
    crate::{
        constants::{
            DEFAULT_HEADER_LINES, LEVEL_VARIABLE, MEASUREMENT_PREFIX, NO_CODE, STATUS_OK,
            TIME_VARIABLE,
        },
        error::GaugeError,
        gauge::{GaugeRecord, GeoLocation},
        mat::MatFile,
        reconcile::CollisionPolicy,
        series::TimeSeries,
        utils::decimal_degrees,
    },
    log::{debug, info, warn},
    serde::Deserialize,
    std::{
        collections::BTreeMap,
        fs,
        path::{Path, PathBuf},
    },
};

/// Column positions in the station metadata table
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnLayout {
    pub label: usize,
    /// Numeric gauge code, `-` when the station has none
    pub code: usize,
    pub latitude_degrees: usize,
    pub latitude_minutes: usize,
    pub longitude_degrees: usize,
    pub longitude_minutes: usize,
    pub status: usize,
    /// Depth components, summed
    pub depth: Vec<usize>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        ColumnLayout {
            label: 0,
            code: 1,
            latitude_degrees: 2,
            latitude_minutes: 3,
            longitude_degrees: 4,
            longitude_minutes: 5,
            status: 8,
            depth: vec![9, 10],
        }
    }
}

impl ColumnLayout {
    fn width(&self) -> usize {
        [
            self.label,
            self.code,
            self.latitude_degrees,
            self.latitude_minutes,
            self.longitude_degrees,
            self.longitude_minutes,
            self.status,
        ]
        .iter()
        .chain(self.depth.iter())
        .max()
        .map_or(0, |m| m + 1)
    }
}

/// Station row from the metadata table
#[derive(Debug, Clone, PartialEq)]
pub struct StationMetadata {
    pub label: String,
    pub gauge_no: u32,
    pub location: GeoLocation,
    pub depth: f64,
    /// 1-based line in the metadata file
    pub line: usize,
}

/// Row left out of the station table because it could not be parsed
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: String,
}

/// Parsed metadata table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationTable {
    pub stations: Vec<StationMetadata>,
    /// Rows with a status other than `OK`
    pub inactive: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Outcome of parsing a single metadata row
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Station(StationMetadata),
    Inactive,
}

/// Parses one metadata row, `line` being its 1-based position in the file
pub fn parse_station_row(text: &str, line: usize, layout: &ColumnLayout) -> Result<Row, String> {
    let fields = text.split_whitespace().collect::<Vec<&str>>();
    let width = layout.width();
    if fields.len() < width {
        return Err(format!(
            "expected at least {} columns, found {}",
            width,
            fields.len()
        ));
    }

    if fields[layout.status] != STATUS_OK {
        return Ok(Row::Inactive);
    }

    let number = |column: usize, what: &str| {
        fields[column]
            .parse::<f64>()
            .map_err(|_| format!("{} {:?} is not a number", what, fields[column]))
    };

    let label = fields[layout.label].to_string();
    let gauge_no = gauge_number(&label, fields[layout.code])?;

    let location = GeoLocation {
        latitude: decimal_degrees(
            number(layout.latitude_degrees, "latitude degrees")?,
            number(layout.latitude_minutes, "latitude minutes")?,
        ),
        longitude: decimal_degrees(
            number(layout.longitude_degrees, "longitude degrees")?,
            number(layout.longitude_minutes, "longitude minutes")?,
        ),
    };

    let depth = layout
        .depth
        .iter()
        .map(|&column| number(column, "depth"))
        .sum::<Result<f64, String>>()?;

    Ok(Row::Station(StationMetadata {
        label,
        gauge_no,
        location,
        depth,
        line,
    }))
}

/// Resolves a gauge number from the code column, falling back to the code
/// point of a single-character label
pub fn gauge_number(label: &str, code: &str) -> Result<u32, String> {
    if code != NO_CODE {
        return code
            .parse::<u32>()
            .map_err(|_| format!("gauge code {:?} is not a number", code));
    }

    let mut chars = label.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c as u32),
        _ => Err(format!(
            "station {:?} has no gauge code and no single-character label",
            label
        )),
    }
}

/// Reads the metadata table at `path`, skipping exactly `header_lines` lines
pub fn read_station_table<P: AsRef<Path>>(
    path: P,
    header_lines: usize,
    layout: &ColumnLayout,
) -> Result<StationTable, GaugeError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| GaugeError::io(path, e))?;

    let mut table = StationTable::default();

    for (i, text) in contents.lines().enumerate().skip(header_lines) {
        let line = i + 1;
        if text.trim().is_empty() {
            continue;
        }

        match parse_station_row(text, line, layout) {
            Ok(Row::Station(station)) => table.stations.push(station),
            Ok(Row::Inactive) => table.inactive += 1,
            Err(reason) => {
                warn!(
                    "{}",
                    GaugeError::MalformedRow {
                        path: path.to_owned(),
                        line,
                        reason: reason.clone(),
                    }
                );
                table.skipped.push(SkippedRow { line, reason });
            }
        }
    }

    debug!(
        "{:?}: {} stations, {} inactive, {} skipped",
        path,
        table.stations.len(),
        table.inactive,
        table.skipped.len()
    );

    Ok(table)
}

/// Source of the measured series for a station
pub trait MeasurementSource {
    fn load(&self, station: &StationMetadata, directory: &Path) -> Result<TimeSeries, GaugeError>;
}

/// Measurements stored as one MAT file per station
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatMeasurements {
    /// File name is this prefix, the station label and `.mat`
    pub prefix: String,
    /// 1xN array of timestamps, first row used
    pub time_variable: String,
    /// Nx1 array of mean water levels, first column used
    pub level_variable: String,
}

impl Default for MatMeasurements {
    fn default() -> Self {
        MatMeasurements {
            prefix: MEASUREMENT_PREFIX.to_string(),
            time_variable: TIME_VARIABLE.to_string(),
            level_variable: LEVEL_VARIABLE.to_string(),
        }
    }
}

impl MatMeasurements {
    pub fn path(&self, station: &StationMetadata, directory: &Path) -> PathBuf {
        directory.join(format!("{}{}.mat", self.prefix, station.label))
    }
}

impl MeasurementSource for MatMeasurements {
    fn load(&self, station: &StationMetadata, directory: &Path) -> Result<TimeSeries, GaugeError> {
        let path = self.path(station, directory);
        let bytes = fs::read(&path).map_err(|e| GaugeError::io(&path, e))?;
        let mat = MatFile::parse(&bytes).map_err(|source| GaugeError::Measurement {
            path: path.clone(),
            source,
        })?;

        let missing = |name: &str| GaugeError::MissingVariable {
            path: path.clone(),
            name: name.to_string(),
        };

        let time = mat
            .find(&self.time_variable)
            .and_then(|a| a.row(0))
            .ok_or_else(|| missing(&self.time_variable))?;
        let level = mat
            .find(&self.level_variable)
            .and_then(|a| a.column(0))
            .ok_or_else(|| missing(&self.level_variable))?;

        TimeSeries::from_vecs(time, level)
    }
}

/// Loads every `OK` station listed in the metadata table at `path` along with
/// its measurements, read from the table's directory
///
/// A label listed on more than one `OK` row is resolved with `collision`.
pub fn load_observed_gauges<P: AsRef<Path>>(
    path: P,
    header_lines: usize,
    layout: &ColumnLayout,
    measurements: &dyn MeasurementSource,
    collision: CollisionPolicy,
) -> Result<BTreeMap<String, GaugeRecord>, GaugeError> {
    let path = path.as_ref();
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    let table = read_station_table(path, header_lines, layout)?;

    let mut gauges: BTreeMap<String, GaugeRecord> = BTreeMap::new();
    for station in table.stations {
        if let Some(first) = gauges.get(&station.label) {
            match collision {
                CollisionPolicy::Reject => {
                    return Err(GaugeError::DuplicateStation {
                        path: path.to_owned(),
                        label: station.label,
                        first: first.line,
                        second: station.line,
                    })
                }
                CollisionPolicy::FirstWins => {
                    warn!(
                        "Station {} listed again on line {}, keeping line {}",
                        station.label, station.line, first.line
                    );
                    continue;
                }
            }
        }

        let series = measurements.load(&station, directory)?;
        debug!(
            "station {} (gauge {}) at {}: {} samples",
            station.label,
            station.gauge_no,
            station.location,
            series.len()
        );

        gauges.insert(
            station.label.clone(),
            GaugeRecord {
                station_id: station.label,
                gauge_no: station.gauge_no,
                location: station.location,
                depth: station.depth,
                series,
                line: station.line,
            },
        );
    }

    info!("Loaded {} observed gauges from {:?}", gauges.len(), path);

    Ok(gauges)
}

/// Loads observed gauges with the default header length, column layout, MAT
/// measurements and collision policy
pub fn load_observed_gauges_default<P: AsRef<Path>>(
    path: P,
) -> Result<BTreeMap<String, GaugeRecord>, GaugeError> {
    load_observed_gauges(
        path,
        DEFAULT_HEADER_LINES,
        &ColumnLayout::default(),
        &MatMeasurements::default(),
        CollisionPolicy::default(),
    )
}
