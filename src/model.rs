use {
    crate::error::GaugeError,
    log::{debug, info},
    ndarray::Array2,
    std::{
        collections::BTreeMap,
        fs,
        path::{Path, PathBuf},
    },
};

/// Path of the reference model's output for station `number`
pub fn model_gauge_path<P: AsRef<Path>>(base: P, number: u32) -> PathBuf {
    base.as_ref().join(format!("stat{:04}.dat", number))
}

/// Reads a whitespace-separated numeric table, ignoring blank lines and `#` comments
pub fn read_numeric_table<P: AsRef<Path>>(path: P) -> Result<Array2<f64>, GaugeError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| GaugeError::io(path, e))?;

    let malformed = |line: usize, reason: String| GaugeError::MalformedRow {
        path: path.to_owned(),
        line,
        reason,
    };

    let mut columns = None;
    let mut rows = 0;
    let mut data = Vec::new();

    for (i, text) in contents.lines().enumerate() {
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let before = data.len();
        for field in text.split_whitespace() {
            let x = field
                .parse::<f64>()
                .map_err(|_| malformed(i + 1, format!("{:?} is not a number", field)))?;
            data.push(x);
        }

        let width = data.len() - before;
        match columns {
            None => columns = Some(width),
            Some(n) if n != width => {
                return Err(malformed(
                    i + 1,
                    format!("expected {} columns, found {}", n, width),
                ))
            }
            _ => (),
        }
        rows += 1;
    }

    let columns = columns.unwrap_or(0);
    if columns < 2 {
        return Err(malformed(
            0,
            format!("expected at least two columns, found {}", columns),
        ));
    }

    Array2::from_shape_vec((rows, columns), data)
        .map_err(|e| GaugeError::InvalidSeries(format!("{:?}: {}", path, e)))
}

/// Loads one raw table per requested station, keyed by the station's 1-based
/// position in `station_numbers`
pub fn load_model_gauges<P: AsRef<Path>>(
    station_numbers: &[u32],
    path: P,
) -> Result<BTreeMap<usize, Array2<f64>>, GaugeError> {
    let mut gauges = BTreeMap::new();

    for (i, &number) in station_numbers.iter().enumerate() {
        let file = model_gauge_path(&path, number);
        let table = read_numeric_table(&file)?;
        debug!("Read reference gauge file {:?}: {:?}", file, table.dim());
        gauges.insert(i + 1, table);
    }

    info!(
        "Loaded {} reference gauges from {:?}",
        gauges.len(),
        path.as_ref()
    );

    Ok(gauges)
}

#[cfg(test)]
mod test {
    use {super::*, ndarray::array, tempdir::TempDir};

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn padded_file_names() {
        assert_eq!(
            model_gauge_path("P", 120),
            Path::new("P").join("stat0120.dat")
        );
        assert_eq!(model_gauge_path("P", 7), Path::new("P").join("stat0007.dat"));
    }

    #[test]
    fn reads_requested_files() {
        let dir = TempDir::new("model").unwrap();
        write(dir.path(), "stat0120.dat", "0.0 0.1\n3600.0 0.2\n");
        write(dir.path(), "stat0121.dat", "# adcirc\n0.0 1.1\n\n3600.0 1.2\n7200.0 1.3\n");

        let gauges = load_model_gauges(&[120, 121], dir.path()).unwrap();

        assert_eq!(gauges.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(gauges[&1], array![[0.0, 0.1], [3600.0, 0.2]]);
        assert_eq!(gauges[&2].dim(), (3, 2));
        assert_eq!(gauges[&2][[2, 1]], 1.3);
    }

    #[test]
    fn missing_station_file() {
        let dir = TempDir::new("model").unwrap();
        write(dir.path(), "stat0120.dat", "0.0 0.1\n");

        match load_model_gauges(&[120, 122], dir.path()) {
            Err(GaugeError::MissingFile { path }) => {
                assert_eq!(path, dir.path().join("stat0122.dat"))
            }
            other => panic!("expected missing file, got {:?}", other),
        }
    }

    #[test]
    fn ragged_rows() {
        let dir = TempDir::new("model").unwrap();
        write(dir.path(), "stat0001.dat", "0.0 0.1\n1.0 0.2 0.3\n");

        assert!(matches!(
            load_model_gauges(&[1], dir.path()),
            Err(GaugeError::MalformedRow { line: 2, .. })
        ));
    }

    #[test]
    fn single_column() {
        let dir = TempDir::new("model").unwrap();
        write(dir.path(), "stat0001.dat", "0.0\n1.0\n");

        assert!(load_model_gauges(&[1], dir.path()).is_err());
    }

    #[test]
    fn non_numeric() {
        let dir = TempDir::new("model").unwrap();
        write(dir.path(), "stat0001.dat", "0.0 nope\n");

        assert!(matches!(
            read_numeric_table(dir.path().join("stat0001.dat")),
            Err(GaugeError::MalformedRow { line: 1, .. })
        ));
    }
}
