//! Simulated gauge output.
//!
//! The solver writes every gauge sample to a single file, one line per sample:
//! gauge number, refinement level, time in seconds, then the q fields.

use {
    crate::{error::GaugeError, series::TimeSeries},
    log::info,
    std::{collections::BTreeMap, fs, path::Path},
};

const GAUGE_COLUMN: usize = 0;
const TIME_COLUMN: usize = 2;
const FIRST_FIELD: usize = 3;

/// Loads the combined gauge file at `path`, taking q field `surface_field` as
/// the value of each sample
pub fn load_simulated_gauges<P: AsRef<Path>>(
    path: P,
    surface_field: usize,
) -> Result<BTreeMap<u32, TimeSeries>, GaugeError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| GaugeError::io(path, e))?;
    let column = FIRST_FIELD + surface_field;

    let mut samples: BTreeMap<u32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();

    for (i, text) in contents.lines().enumerate() {
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let malformed = |reason: String| GaugeError::MalformedRow {
            path: path.to_owned(),
            line: i + 1,
            reason,
        };

        let fields = text
            .split_whitespace()
            .map(|f| {
                f.parse::<f64>()
                    .map_err(|_| malformed(format!("{:?} is not a number", f)))
            })
            .collect::<Result<Vec<f64>, GaugeError>>()?;

        if fields.len() <= column {
            return Err(malformed(format!(
                "expected at least {} columns, found {}",
                column + 1,
                fields.len()
            )));
        }

        let gauge_no = fields[GAUGE_COLUMN];
        if gauge_no < 0.0 || gauge_no.fract() != 0.0 {
            return Err(malformed(format!("{} is not a gauge number", gauge_no)));
        }

        let (time, value) = samples.entry(gauge_no as u32).or_default();
        time.push(fields[TIME_COLUMN]);
        value.push(fields[column]);
    }

    let gauges = samples
        .into_iter()
        .map(|(gauge_no, (time, value))| Ok((gauge_no, TimeSeries::from_vecs(time, value)?)))
        .collect::<Result<BTreeMap<u32, TimeSeries>, GaugeError>>()?;

    info!("Loaded {} simulated gauges from {:?}", gauges.len(), path);

    Ok(gauges)
}
