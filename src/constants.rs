pub const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;
pub const MINUTES_PER_DEGREE: f64 = 60.0;

/// Lines preceding the first station row of the observed metadata table
pub const DEFAULT_HEADER_LINES: usize = 5;
/// Status flag marking a usable station row
pub const STATUS_OK: &str = "OK";
/// Placeholder in the code column when a station has no numeric code
pub const NO_CODE: &str = "-";

pub const METADATA_FILE: &str = "Ike_Gauges_web.txt";
pub const MEASUREMENT_PREFIX: &str = "result_";
pub const TIME_VARIABLE: &str = "yd_processed";
pub const LEVEL_VARIABLE: &str = "mean_water";

pub const MODEL_STATIONS: [u32; 4] = [120, 121, 122, 123];
pub const SIMULATED_GAUGE_FILE: &str = "fort.gauge";
/// Observed station label of each simulated gauge number
pub const SIMULATED_LABELS: [(u32, &str); 4] = [(1, "W"), (2, "X"), (3, "Y"), (4, "Z")];
/// Index into the q fields of a simulated gauge sample holding the top surface
pub const SURFACE_FIELD: usize = 3;
