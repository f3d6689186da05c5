use {
    crate::{error::GaugeError, gauge::GeoLocation, series::TimeSeries},
    serde::Deserialize,
    std::{
        collections::BTreeMap,
        fmt,
        fs,
        path::{Path, PathBuf},
    },
};

/// Data source contributing a series to the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Source {
    Observed,
    Simulated,
    Reference,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Observed, Source::Simulated, Source::Reference];
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Observed => "observed",
            Source::Simulated => "simulated",
            Source::Reference => "reference",
        })
    }
}

/// Axis limits of a gauge comparison plot, time in days relative to landfall
/// and surface in metres
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PlotWindow {
    pub time: [f64; 2],
    pub surface: [f64; 2],
}

impl Default for PlotWindow {
    fn default() -> Self {
        PlotWindow {
            time: [-2.0, 1.0],
            surface: [-1.0, 5.0],
        }
    }
}

/// One station's series from every source, in days relative to landfall
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEntry {
    pub gauge_no: u32,
    pub station_id: String,
    pub location: GeoLocation,
    pub depth: f64,
    pub observed: TimeSeries,
    pub simulated: TimeSeries,
    pub reference: TimeSeries,
}

impl OverlayEntry {
    pub fn series(&self, source: Source) -> &TimeSeries {
        match source {
            Source::Observed => &self.observed,
            Source::Simulated => &self.simulated,
            Source::Reference => &self.reference,
        }
    }

    /// Entry with every series restricted to the window's time range
    pub fn clipped(&self, window: &PlotWindow) -> Self {
        let [start, end] = window.time;
        OverlayEntry {
            observed: self.observed.window(start, end),
            simulated: self.simulated.window(start, end),
            reference: self.reference.window(start, end),
            ..self.clone()
        }
    }

    /// Plain-text rendering read by the plotting scripts
    pub fn ascii<'a>(&'a self, window: &'a PlotWindow) -> AsciiOverlay<'a> {
        AsciiOverlay {
            entry: self,
            window,
        }
    }

    pub fn to_ascii(&self, window: &PlotWindow) -> String {
        self.ascii(window).to_string()
    }
}

/// Overlay file contents: a commented header, then one block of
/// `time value` rows per source
pub struct AsciiOverlay<'a> {
    entry: &'a OverlayEntry,
    window: &'a PlotWindow,
}

impl fmt::Display for AsciiOverlay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let AsciiOverlay { entry, window } = self;

        writeln!(f, "# station {} gauge {}", entry.station_id, entry.gauge_no)?;
        writeln!(
            f,
            "# location {:.6} {:.6} depth {:.6}",
            entry.location.latitude, entry.location.longitude, entry.depth
        )?;
        writeln!(
            f,
            "# window time {} {} surface {} {}",
            window.time[0], window.time[1], window.surface[0], window.surface[1]
        )?;

        for source in Source::ALL.iter() {
            let series = entry.series(*source);
            writeln!(f, "# source {} {}", source, series.len())?;
            for (t, v) in series.iter() {
                writeln!(f, "{:.6} {:.6}", t, v)?;
            }
        }

        Ok(())
    }
}

/// Station left out of the overlay and the sources it was missing from
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    pub gauge_no: u32,
    pub missing: Vec<Source>,
}

/// Time-aligned gauge series ready for comparison plotting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciledOverlay {
    entries: BTreeMap<u32, OverlayEntry>,
    excluded: Vec<Exclusion>,
}

impl ReconciledOverlay {
    pub fn new(entries: BTreeMap<u32, OverlayEntry>, excluded: Vec<Exclusion>) -> Self {
        ReconciledOverlay { entries, excluded }
    }

    pub fn get(&self, gauge_no: u32) -> Option<&OverlayEntry> {
        self.entries.get(&gauge_no)
    }

    pub fn contains(&self, gauge_no: u32) -> bool {
        self.entries.contains_key(&gauge_no)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in gauge number order
    pub fn iter(&self) -> impl Iterator<Item = &OverlayEntry> {
        self.entries.values()
    }

    pub fn excluded(&self) -> &[Exclusion] {
        &self.excluded
    }

    /// Writes one `gaugeNNNN.asc` file per entry into `directory`, clipped to `window`
    pub fn write_ascii<P: AsRef<Path>>(
        &self,
        directory: P,
        window: &PlotWindow,
    ) -> Result<Vec<PathBuf>, GaugeError> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory).map_err(|e| GaugeError::io(directory, e))?;

        self.iter()
            .map(|entry| {
                let path = directory.join(format!("gauge{:04}.asc", entry.gauge_no));
                fs::write(&path, entry.clipped(window).to_ascii(window))
                    .map_err(|e| GaugeError::io(&path, e))?;
                Ok(path)
            })
            .collect()
    }
}
