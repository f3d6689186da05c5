use {
    crate::{
        constants::{
            DEFAULT_HEADER_LINES, METADATA_FILE, MODEL_STATIONS, SIMULATED_GAUGE_FILE,
            SIMULATED_LABELS, SURFACE_FIELD,
        },
        landfall::SourceLandfall,
        observed::{ColumnLayout, MatMeasurements},
        overlay::PlotWindow,
        reconcile::CollisionPolicy,
        series::TimeUnit,
    },
    chrono::{NaiveDate, NaiveDateTime},
    serde::Deserialize,
    std::{collections::BTreeMap, path::PathBuf},
};

/// Post-processing parameters
#[derive(Debug, PartialEq, Default, Deserialize)]
pub struct Parameters {
    pub environment: Environment,
    pub observed: Observed,
    pub simulated: Simulated,
    pub reference: Reference,
    pub landfall: Landfall,
    pub overlay: Overlay,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Environment {
    /// Directory the overlay files are written to
    pub output_directory: PathBuf,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            output_directory: PathBuf::from("_plots/gauges"),
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Observed {
    /// Directory holding the metadata table and the measurement files
    pub directory: PathBuf,
    /// Metadata table file name
    pub metadata_file: String,
    /// Lines skipped before the first station row
    pub header_lines: usize,
    pub columns: ColumnLayout,
    pub measurements: MatMeasurements,
    /// Add the station depth to observed levels
    pub add_station_depth: bool,
    /// Datum correction added to observed levels
    pub offset: f64,
}

impl Default for Observed {
    fn default() -> Self {
        Observed {
            directory: PathBuf::from("gauge_data"),
            metadata_file: METADATA_FILE.to_string(),
            header_lines: DEFAULT_HEADER_LINES,
            columns: ColumnLayout::default(),
            measurements: MatMeasurements::default(),
            add_station_depth: true,
            offset: 0.0,
        }
    }
}

impl Observed {
    pub fn metadata_path(&self) -> PathBuf {
        self.directory.join(&self.metadata_file)
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Simulated {
    /// Combined gauge output of the solver
    pub gauge_file: PathBuf,
    /// q field holding the top surface
    pub surface_field: usize,
    /// Datum correction added to simulated levels
    pub offset: f64,
    /// Observed station label of each simulated gauge, an empty map matches
    /// gauges on their number
    pub labels: BTreeMap<u32, String>,
}

impl Default for Simulated {
    fn default() -> Self {
        Simulated {
            gauge_file: PathBuf::from("_output").join(SIMULATED_GAUGE_FILE),
            surface_field: SURFACE_FIELD,
            offset: 0.0,
            labels: SIMULATED_LABELS
                .iter()
                .map(|&(gauge_no, label)| (gauge_no, label.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Reference {
    /// Directory holding the reference model's station files
    pub directory: PathBuf,
    /// Station numbers in file names, the n-th entry is gauge n
    pub stations: Vec<u32>,
    /// Datum correction added to reference levels
    pub offset: f64,
}

impl Default for Reference {
    fn default() -> Self {
        Reference {
            directory: PathBuf::from("gauge_data/new_data"),
            stations: MODEL_STATIONS.to_vec(),
            offset: 0.0,
        }
    }
}

/// Landfall instants per source
///
/// The observed and simulated instants differ by two days in the default
/// configuration. This matches the shipped plots but the cause (leap year or
/// day-of-year counting) has not been confirmed.
#[derive(Debug, PartialEq, Deserialize)]
pub struct Landfall {
    /// Zero point of calendar instants
    pub epoch: NaiveDateTime,
    pub observed: SourceLandfall,
    pub simulated: SourceLandfall,
    pub reference: SourceLandfall,
}

fn datetime(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

impl Default for Landfall {
    fn default() -> Self {
        Landfall {
            epoch: datetime(2008, 1, 1, 0),
            observed: SourceLandfall::at(datetime(2008, 9, 14, 7), TimeUnit::Days),
            simulated: SourceLandfall::at(datetime(2008, 9, 12, 7), TimeUnit::Seconds),
            reference: SourceLandfall::after_days(4.25, TimeUnit::Seconds),
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Overlay {
    /// Gauge numbers to compare
    pub stations: Vec<u32>,
    pub collision: CollisionPolicy,
    pub window: PlotWindow,
}

impl Default for Overlay {
    fn default() -> Self {
        Overlay {
            stations: vec![1, 2, 3, 4],
            collision: CollisionPolicy::Reject,
            window: PlotWindow::default(),
        }
    }
}
