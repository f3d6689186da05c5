use {
    crate::{constants::SECONDS_PER_DAY, error::GaugeError},
    ndarray::{Array1, Array2, ArrayView1},
    serde::Deserialize,
};

/// Unit a data source encodes its timestamps in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Seconds,
    Days,
}

/// Water surface samples ordered by time
///
/// Time and value arrays always have the same length, timestamps are finite
/// and time never decreases.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    time: Array1<f64>,
    value: Array1<f64>,
}

impl TimeSeries {
    pub fn new(time: Array1<f64>, value: Array1<f64>) -> Result<Self, GaugeError> {
        if time.len() != value.len() {
            return Err(GaugeError::InvalidSeries(format!(
                "{} timestamps but {} values",
                time.len(),
                value.len()
            )));
        }

        if let Some(i) = time.iter().position(|t| !t.is_finite()) {
            return Err(GaugeError::InvalidSeries(format!(
                "timestamp {} at sample {} is not finite",
                time[i], i
            )));
        }

        if let Some(i) = (1..time.len()).find(|&i| time[i] < time[i - 1]) {
            return Err(GaugeError::InvalidSeries(format!(
                "time decreases at sample {} ({} after {})",
                i,
                time[i],
                time[i - 1]
            )));
        }

        Ok(TimeSeries { time, value })
    }

    pub fn from_vecs(time: Vec<f64>, value: Vec<f64>) -> Result<Self, GaugeError> {
        Self::new(Array1::from(time), Array1::from(value))
    }

    /// Takes time and value from two columns of a raw numeric table
    pub fn from_columns(
        table: &Array2<f64>,
        time_column: usize,
        value_column: usize,
    ) -> Result<Self, GaugeError> {
        let columns = table.ncols();
        if time_column >= columns || value_column >= columns {
            return Err(GaugeError::InvalidSeries(format!(
                "table has {} columns, need columns {} and {}",
                columns, time_column, value_column
            )));
        }

        Self::new(
            table.column(time_column).to_owned(),
            table.column(value_column).to_owned(),
        )
    }

    pub fn time(&self) -> ArrayView1<f64> {
        self.time.view()
    }

    pub fn value(&self) -> ArrayView1<f64> {
        self.value.view()
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Re-expresses the time axis in days relative to `landfall`, given in seconds
    pub fn recentred(&self, unit: TimeUnit, landfall: f64) -> Self {
        let time = match unit {
            TimeUnit::Seconds => (&self.time - landfall) / SECONDS_PER_DAY,
            TimeUnit::Days => &self.time - landfall / SECONDS_PER_DAY,
        };

        TimeSeries {
            time,
            value: self.value.clone(),
        }
    }

    pub fn offset(&self, by: f64) -> Self {
        TimeSeries {
            time: self.time.clone(),
            value: &self.value + by,
        }
    }

    /// Samples with `start <= time <= end`
    pub fn window(&self, start: f64, end: f64) -> Self {
        let keep = self
            .time
            .iter()
            .enumerate()
            .filter(|(_, t)| **t >= start && **t <= end)
            .map(|(i, _)| i)
            .collect::<Vec<usize>>();

        TimeSeries {
            time: keep.iter().map(|&i| self.time[i]).collect(),
            value: keep.iter().map(|&i| self.value[i]).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time.iter().copied().zip(self.value.iter().copied())
    }
}
