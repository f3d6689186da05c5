use {
    crate::{
        error::GaugeError,
        gauge::GaugeRecord,
        landfall::LandfallReference,
        model::load_model_gauges,
        observed::load_observed_gauges,
        overlay::ReconciledOverlay,
        parameters::Parameters,
        reconcile::{reconcile, ReconcileOptions, SurfaceOffsets},
        series::TimeSeries,
        simulated::load_simulated_gauges,
    },
    log::info,
    ndarray::Array2,
    std::collections::BTreeMap,
};

/// Gauge sources of one plotting session
///
/// All files are read by [`Reconciler::load`]; reconciling afterwards only
/// works on the data held here.
#[derive(Debug, Clone)]
pub struct Reconciler {
    observed: BTreeMap<String, GaugeRecord>,
    simulated: BTreeMap<u32, TimeSeries>,
    reference: BTreeMap<usize, Array2<f64>>,
    landfall: LandfallReference,
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(
        observed: BTreeMap<String, GaugeRecord>,
        simulated: BTreeMap<u32, TimeSeries>,
        reference: BTreeMap<usize, Array2<f64>>,
        landfall: LandfallReference,
        options: ReconcileOptions,
    ) -> Self {
        Reconciler {
            observed,
            simulated,
            reference,
            landfall,
            options,
        }
    }

    /// Reads every source named in `params`
    pub fn load(params: &Parameters) -> Result<Self, GaugeError> {
        let landfall = landfall_reference(params)?;

        let observed = load_observed_gauges(
            params.observed.metadata_path(),
            params.observed.header_lines,
            &params.observed.columns,
            &params.observed.measurements,
            params.overlay.collision,
        )?;
        let simulated = load_simulated_gauges(
            &params.simulated.gauge_file,
            params.simulated.surface_field,
        )?;
        let reference =
            load_model_gauges(&params.reference.stations, &params.reference.directory)?;

        info!(
            "Session loaded: {} observed, {} simulated, {} reference gauges",
            observed.len(),
            simulated.len(),
            reference.len()
        );

        Ok(Reconciler::new(
            observed,
            simulated,
            reference,
            landfall,
            reconcile_options(params),
        ))
    }

    pub fn observed(&self) -> &BTreeMap<String, GaugeRecord> {
        &self.observed
    }

    pub fn simulated(&self) -> &BTreeMap<u32, TimeSeries> {
        &self.simulated
    }

    pub fn reference(&self) -> &BTreeMap<usize, Array2<f64>> {
        &self.reference
    }

    pub fn landfall(&self) -> &LandfallReference {
        &self.landfall
    }

    pub fn reconcile(&self) -> Result<ReconciledOverlay, GaugeError> {
        reconcile(
            &self.observed,
            &self.simulated,
            &self.reference,
            &self.landfall,
            &self.options,
        )
    }
}

pub fn landfall_reference(params: &Parameters) -> Result<LandfallReference, GaugeError> {
    let landfall = &params.landfall;
    Ok(LandfallReference {
        observed: landfall.observed.clock("observed", landfall.epoch)?,
        simulated: landfall.simulated.clock("simulated", landfall.epoch)?,
        reference: landfall.reference.clock("reference", landfall.epoch)?,
    })
}

pub fn reconcile_options(params: &Parameters) -> ReconcileOptions {
    ReconcileOptions {
        offsets: SurfaceOffsets {
            observed: params.observed.offset,
            simulated: params.simulated.offset,
            reference: params.reference.offset,
        },
        add_station_depth: params.observed.add_station_depth,
        collision: params.overlay.collision,
        stations: Some(params.overlay.stations.clone()),
        simulated_labels: params.simulated.labels.clone(),
    }
}
