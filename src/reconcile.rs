//! Aligns the three gauge sources on a common landfall-relative time axis.

use {
    crate::{
        error::GaugeError,
        gauge::GaugeRecord,
        landfall::LandfallReference,
        overlay::{Exclusion, OverlayEntry, ReconciledOverlay, Source},
        series::TimeSeries,
    },
    log::{debug, info, warn},
    ndarray::Array2,
    serde::Deserialize,
    std::collections::{BTreeMap, BTreeSet},
};

/// Resolution when two observed stations share a gauge number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Fail the reconciliation
    Reject,
    /// Keep the station listed first in the metadata table
    FirstWins,
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        CollisionPolicy::Reject
    }
}

/// Scalar added to every value of a source to bring it onto a common datum
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct SurfaceOffsets {
    pub observed: f64,
    pub simulated: f64,
    pub reference: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOptions {
    pub offsets: SurfaceOffsets,
    /// Observed levels are relative to the sensor, add the station depth
    pub add_station_depth: bool,
    pub collision: CollisionPolicy,
    /// Gauge numbers to consider, all when `None`
    pub stations: Option<Vec<u32>>,
    /// Observed station label of each simulated gauge number. When empty,
    /// simulated gauges are matched on the observed gauge number.
    pub simulated_labels: BTreeMap<u32, String>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions {
            offsets: SurfaceOffsets::default(),
            add_station_depth: true,
            collision: CollisionPolicy::default(),
            stations: None,
            simulated_labels: BTreeMap::new(),
        }
    }
}

/// Indexes observed records by gauge number, applying `policy` to duplicates
pub fn index_observed(
    observed: &BTreeMap<String, GaugeRecord>,
    policy: CollisionPolicy,
) -> Result<BTreeMap<u32, &GaugeRecord>, GaugeError> {
    let mut records = observed.values().collect::<Vec<&GaugeRecord>>();
    records.sort_by_key(|r| r.line);

    let mut index: BTreeMap<u32, &GaugeRecord> = BTreeMap::new();
    for record in records {
        if let Some(first) = index.get(&record.gauge_no) {
            match policy {
                CollisionPolicy::Reject => {
                    return Err(GaugeError::StationCollision {
                        gauge_no: record.gauge_no,
                        first: first.station_id.clone(),
                        second: record.station_id.clone(),
                    })
                }
                CollisionPolicy::FirstWins => {
                    warn!(
                        "Station {} shares gauge {} with {}, keeping {}",
                        record.station_id, record.gauge_no, first.station_id, first.station_id
                    );
                    continue;
                }
            }
        }
        index.insert(record.gauge_no, record);
    }

    Ok(index)
}

/// Keys simulated series by the gauge number of the observed station they
/// were placed at
///
/// Simulated gauges without a label, or labelled with a station absent from
/// the observed table, are logged and left out.
pub fn match_simulated<'a>(
    simulated: &'a BTreeMap<u32, TimeSeries>,
    observed: &BTreeMap<u32, &GaugeRecord>,
    options: &ReconcileOptions,
) -> Result<BTreeMap<u32, &'a TimeSeries>, GaugeError> {
    if options.simulated_labels.is_empty() {
        return Ok(simulated.iter().map(|(&g, series)| (g, series)).collect());
    }

    let by_label = observed
        .values()
        .map(|r| (r.station_id.as_str(), r.gauge_no))
        .collect::<BTreeMap<&str, u32>>();

    let mut matched: BTreeMap<u32, (u32, &TimeSeries)> = BTreeMap::new();
    for (&simulated_no, series) in simulated {
        let label = match options.simulated_labels.get(&simulated_no) {
            Some(label) => label,
            None => {
                warn!("Simulated gauge {} has no station label", simulated_no);
                continue;
            }
        };
        let gauge_no = match by_label.get(label.as_str()) {
            Some(&gauge_no) => gauge_no,
            None => {
                warn!(
                    "Simulated gauge {} is labelled {} which is not an observed station",
                    simulated_no, label
                );
                continue;
            }
        };

        if let Some(&(first, _)) = matched.get(&gauge_no) {
            match options.collision {
                CollisionPolicy::Reject => {
                    return Err(GaugeError::SimulatedCollision {
                        label: label.clone(),
                        first,
                        second: simulated_no,
                    })
                }
                CollisionPolicy::FirstWins => {
                    warn!(
                        "Simulated gauges {} and {} are both labelled {}, keeping {}",
                        first, simulated_no, label, first
                    );
                    continue;
                }
            }
        }

        debug!(
            "Simulated gauge {} is station {} (gauge {})",
            simulated_no, label, gauge_no
        );
        matched.insert(gauge_no, (simulated_no, series));
    }

    Ok(matched
        .into_iter()
        .map(|(gauge_no, (_, series))| (gauge_no, series))
        .collect())
}

/// Re-expresses every station present in all three sources in days relative
/// to landfall
///
/// `reference` holds raw (time, value) tables keyed by gauge number, simulated
/// series are tied to stations through [`match_simulated`]. Stations missing
/// from any source are logged and listed in the overlay's exclusions.
pub fn reconcile(
    observed: &BTreeMap<String, GaugeRecord>,
    simulated: &BTreeMap<u32, TimeSeries>,
    reference: &BTreeMap<usize, Array2<f64>>,
    landfall: &LandfallReference,
    options: &ReconcileOptions,
) -> Result<ReconciledOverlay, GaugeError> {
    let observed = index_observed(observed, options.collision)?;
    let simulated = match_simulated(simulated, &observed, options)?;

    let wanted = |gauge_no: &u32| {
        options
            .stations
            .as_ref()
            .map_or(true, |stations| stations.contains(gauge_no))
    };

    let candidates = observed
        .keys()
        .copied()
        .chain(simulated.keys().copied())
        .chain(reference.keys().map(|&k| k as u32))
        .filter(wanted)
        .collect::<BTreeSet<u32>>();

    let mut entries = BTreeMap::new();
    let mut excluded = Vec::new();

    for gauge_no in candidates {
        let sources = (
            observed.get(&gauge_no),
            simulated.get(&gauge_no),
            reference.get(&(gauge_no as usize)),
        );

        let (record, simulated_series, reference_table) = match sources {
            (Some(record), Some(series), Some(table)) => (record, series, table),
            _ => {
                let missing = Source::ALL
                    .iter()
                    .copied()
                    .zip(&[
                        sources.0.is_none(),
                        sources.1.is_none(),
                        sources.2.is_none(),
                    ])
                    .filter(|(_, absent)| **absent)
                    .map(|(source, _)| source)
                    .collect::<Vec<Source>>();

                warn!(
                    "Gauge {} is missing from the {} data, excluded from the overlay",
                    gauge_no,
                    missing
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<String>>()
                        .join(" and ")
                );
                excluded.push(Exclusion { gauge_no, missing });
                continue;
            }
        };

        let observed_offset = options.offsets.observed
            + if options.add_station_depth {
                record.depth
            } else {
                0.0
            };

        let entry = OverlayEntry {
            gauge_no,
            station_id: record.station_id.clone(),
            location: record.location,
            depth: record.depth,
            observed: record
                .series
                .recentred(landfall.observed.unit, landfall.observed.landfall)
                .offset(observed_offset),
            simulated: simulated_series
                .recentred(landfall.simulated.unit, landfall.simulated.landfall)
                .offset(options.offsets.simulated),
            reference: TimeSeries::from_columns(reference_table, 0, 1)?
                .recentred(landfall.reference.unit, landfall.reference.landfall)
                .offset(options.offsets.reference),
        };

        debug!(
            "Gauge {} ({}): {} observed, {} simulated, {} reference samples",
            gauge_no,
            entry.station_id,
            entry.observed.len(),
            entry.simulated.len(),
            entry.reference.len()
        );

        entries.insert(gauge_no, entry);
    }

    info!(
        "Reconciled {} gauges, excluded {}",
        entries.len(),
        excluded.len()
    );

    Ok(ReconciledOverlay::new(entries, excluded))
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{gauge::GeoLocation, landfall::SourceClock, series::TimeUnit},
        approx::assert_abs_diff_eq,
        ndarray::array,
    };

    fn record(label: &str, gauge_no: u32, line: usize) -> GaugeRecord {
        GaugeRecord {
            station_id: label.to_string(),
            gauge_no,
            location: GeoLocation {
                latitude: 29.0,
                longitude: 94.0,
            },
            depth: 2.0,
            series: TimeSeries::from_vecs(vec![257.0, 258.0, 259.0], vec![0.0, 0.5, 1.0]).unwrap(),
            line,
        }
    }

    fn observed(records: Vec<GaugeRecord>) -> BTreeMap<String, GaugeRecord> {
        records
            .into_iter()
            .map(|r| (r.station_id.clone(), r))
            .collect()
    }

    fn simulated(gauges: &[u32]) -> BTreeMap<u32, TimeSeries> {
        gauges
            .iter()
            .map(|&g| {
                (
                    g,
                    TimeSeries::from_vecs(vec![0.0, 86_400.0, 172_800.0], vec![0.1, 0.2, 0.3])
                        .unwrap(),
                )
            })
            .collect()
    }

    fn reference(gauges: &[usize]) -> BTreeMap<usize, Array2<f64>> {
        gauges
            .iter()
            .map(|&g| (g, array![[0.0, 1.0], [43_200.0, 2.0]]))
            .collect()
    }

    fn landfall() -> LandfallReference {
        LandfallReference {
            observed: SourceClock::new(258.0 * 86_400.0, TimeUnit::Days),
            simulated: SourceClock::new(86_400.0, TimeUnit::Seconds),
            reference: SourceClock::new(43_200.0, TimeUnit::Seconds),
        }
    }

    #[test]
    fn recentres_every_source() {
        let overlay = reconcile(
            &observed(vec![record("W", 1, 6)]),
            &simulated(&[1]),
            &reference(&[1]),
            &landfall(),
            &ReconcileOptions::default(),
        )
        .unwrap();

        let entry = overlay.get(1).unwrap();
        assert_eq!(entry.station_id, "W");
        assert_eq!(entry.observed.time(), array![-1.0, 0.0, 1.0]);
        assert_eq!(entry.simulated.time(), array![-1.0, 0.0, 1.0]);
        assert_eq!(entry.reference.time(), array![-0.5, 0.0]);

        // depth added to observed levels
        assert_eq!(entry.observed.value(), array![2.0, 2.5, 3.0]);
        assert_eq!(entry.simulated.value(), array![0.1, 0.2, 0.3]);
        assert_eq!(entry.reference.value(), array![1.0, 2.0]);
    }

    #[test]
    fn exact_recentring() {
        let times = vec![0.0, 1.0, 3_600.0, 100_000.0, 1_234_567.0];
        let series = TimeSeries::from_vecs(times.clone(), vec![0.0; 5]).unwrap();
        let mut sim = BTreeMap::new();
        sim.insert(1, series);

        let overlay = reconcile(
            &observed(vec![record("W", 1, 6)]),
            &sim,
            &reference(&[1]),
            &landfall(),
            &ReconcileOptions::default(),
        )
        .unwrap();

        let landfall = landfall().simulated.landfall;
        for (t, out) in times.iter().zip(overlay.get(1).unwrap().simulated.time()) {
            assert_abs_diff_eq!(*out, (t - landfall) / 86_400.0);
        }
    }

    #[test]
    fn offsets_per_source() {
        let options = ReconcileOptions {
            offsets: SurfaceOffsets {
                observed: 0.25,
                simulated: -0.5,
                reference: 1.0,
            },
            add_station_depth: false,
            ..ReconcileOptions::default()
        };

        let overlay = reconcile(
            &observed(vec![record("W", 1, 6)]),
            &simulated(&[1]),
            &reference(&[1]),
            &landfall(),
            &options,
        )
        .unwrap();

        let entry = overlay.get(1).unwrap();
        assert_eq!(entry.observed.value(), array![0.25, 0.75, 1.25]);
        assert_eq!(entry.simulated.value(), array![-0.4, -0.3, -0.2]);
        assert_eq!(entry.reference.value(), array![2.0, 3.0]);
    }

    #[test]
    fn absent_from_reference() {
        let overlay = reconcile(
            &observed(vec![record("W", 1, 6), record("X", 2, 7)]),
            &simulated(&[1, 2]),
            &reference(&[1]),
            &landfall(),
            &ReconcileOptions::default(),
        )
        .unwrap();

        assert!(overlay.contains(1));
        assert!(!overlay.contains(2));
        assert_eq!(overlay.len(), 1);
        assert_eq!(
            overlay.excluded(),
            &[Exclusion {
                gauge_no: 2,
                missing: vec![Source::Reference],
            }]
        );
    }

    #[test]
    fn only_in_model_sources() {
        let overlay = reconcile(
            &observed(vec![]),
            &simulated(&[5]),
            &reference(&[5, 6]),
            &landfall(),
            &ReconcileOptions::default(),
        )
        .unwrap();

        assert!(overlay.is_empty());
        assert_eq!(overlay.excluded().len(), 2);
        assert_eq!(
            overlay.excluded()[1].missing,
            vec![Source::Observed, Source::Simulated]
        );
    }

    #[test]
    fn station_filter() {
        let options = ReconcileOptions {
            stations: Some(vec![2]),
            ..ReconcileOptions::default()
        };

        let overlay = reconcile(
            &observed(vec![record("W", 1, 6), record("X", 2, 7)]),
            &simulated(&[1, 2, 3]),
            &reference(&[1, 2]),
            &landfall(),
            &options,
        )
        .unwrap();

        assert_eq!(overlay.iter().map(|e| e.gauge_no).collect::<Vec<_>>(), vec![2]);
        assert!(overlay.excluded().is_empty());
    }

    #[test]
    fn idempotent() {
        let args = (
            observed(vec![record("W", 1, 6), record("X", 2, 7)]),
            simulated(&[1, 2]),
            reference(&[2]),
        );
        let first = reconcile(&args.0, &args.1, &args.2, &landfall(), &Default::default());
        let second = reconcile(&args.0, &args.1, &args.2, &landfall(), &Default::default());

        assert_eq!(first.unwrap(), second.unwrap());
    }

    #[test]
    fn collision_rejected() {
        let result = reconcile(
            &observed(vec![record("W", 1, 6), record("V", 1, 9)]),
            &simulated(&[1]),
            &reference(&[1]),
            &landfall(),
            &ReconcileOptions::default(),
        );

        match result {
            Err(GaugeError::StationCollision {
                gauge_no,
                first,
                second,
            }) => {
                assert_eq!(gauge_no, 1);
                assert_eq!(first, "W");
                assert_eq!(second, "V");
            }
            other => panic!("expected collision, got {:?}", other),
        }
    }

    #[test]
    fn collision_first_wins() {
        let options = ReconcileOptions {
            collision: CollisionPolicy::FirstWins,
            ..ReconcileOptions::default()
        };

        // "V" sorts before "W" but appears later in the metadata table
        let overlay = reconcile(
            &observed(vec![record("W", 1, 6), record("V", 1, 9)]),
            &simulated(&[1]),
            &reference(&[1]),
            &landfall(),
            &options,
        )
        .unwrap();

        assert_eq!(overlay.get(1).unwrap().station_id, "W");
    }

    fn labelled(pairs: &[(u32, &str)]) -> ReconcileOptions {
        ReconcileOptions {
            simulated_labels: pairs.iter().map(|&(g, l)| (g, l.to_string())).collect(),
            ..ReconcileOptions::default()
        }
    }

    #[test]
    fn simulated_matched_by_label() {
        // station W carries code 7 but sits at simulated gauge 1
        let overlay = reconcile(
            &observed(vec![record("W", 7, 6), record("X", 2, 7)]),
            &simulated(&[1, 2]),
            &reference(&[2, 7]),
            &landfall(),
            &labelled(&[(1, "W"), (2, "X")]),
        )
        .unwrap();

        assert_eq!(overlay.iter().map(|e| e.gauge_no).collect::<Vec<_>>(), vec![2, 7]);
        let entry = overlay.get(7).unwrap();
        assert_eq!(entry.station_id, "W");
        assert_eq!(entry.simulated.time(), array![-1.0, 0.0, 1.0]);
        assert_eq!(entry.reference.time(), array![-0.5, 0.0]);
        assert!(overlay.excluded().is_empty());
    }

    #[test]
    fn unlabelled_simulated_gauges() {
        let overlay = reconcile(
            &observed(vec![record("W", 7, 6), record("X", 2, 7)]),
            &simulated(&[1, 3]),
            &reference(&[2, 7]),
            &landfall(),
            &labelled(&[(1, "W"), (3, "Q")]),
        )
        .unwrap();

        // gauge 3 names no observed station, X has no simulated gauge
        assert!(overlay.contains(7));
        assert_eq!(
            overlay.excluded(),
            &[Exclusion {
                gauge_no: 2,
                missing: vec![Source::Simulated],
            }]
        );
    }

    #[test]
    fn simulated_label_collision() {
        let args = (
            observed(vec![record("W", 7, 6)]),
            simulated(&[1, 2]),
            reference(&[7]),
        );
        let options = labelled(&[(1, "W"), (2, "W")]);

        match reconcile(&args.0, &args.1, &args.2, &landfall(), &options) {
            Err(GaugeError::SimulatedCollision {
                label,
                first,
                second,
            }) => {
                assert_eq!(label, "W");
                assert_eq!((first, second), (1, 2));
            }
            other => panic!("expected collision, got {:?}", other),
        }

        let options = ReconcileOptions {
            collision: CollisionPolicy::FirstWins,
            ..options
        };
        let overlay = reconcile(&args.0, &args.1, &args.2, &landfall(), &options).unwrap();
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn reference_needs_two_columns() {
        let mut reference = BTreeMap::new();
        reference.insert(1, array![[0.0], [1.0]]);

        assert!(matches!(
            reconcile(
                &observed(vec![record("W", 1, 6)]),
                &simulated(&[1]),
                &reference,
                &landfall(),
                &ReconcileOptions::default(),
            ),
            Err(GaugeError::InvalidSeries(_))
        ));
    }
}
