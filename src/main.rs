#[macro_use]
extern crate clap;

use {
    anyhow::{bail, Result},
    log::{error, info, warn},
    simplelog::{Config as LogConfig, LevelFilter, TermLogger, TerminalMode},
    std::fs::File,
    surge_gauges::{observed::read_station_table, parameters::Parameters, session::Reconciler},
};

#[quit::main]
fn main() {
    let matches = clap_app!(surge_gauges =>
        (version: crate_version!())
        (@arg PARAMETERS: -p --parameters +takes_value +required "Path to file containing post-processing parameters.")
        (@arg VERBOSE: -v --verbose "Log debug messages.")
        (@subcommand stations =>
            (about: "Lists the active stations of the observed gauge metadata table.")
        )
        (@subcommand reconcile =>
            (about: "Aligns observed, simulated and reference gauge series on landfall and writes one overlay file per gauge.")
        )
    )
    .get_matches();

    TermLogger::init(
        if matches.is_present("VERBOSE") {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        LogConfig::default(),
        TerminalMode::Mixed,
    )
    .expect("Failed to initialize logger");

    let params = {
        // Should never panic as clap should return an error if the argument was not supplied
        let path = matches
            .value_of("PARAMETERS")
            .expect("Path to parameters file not supplied");

        let file = File::open(path).unwrap_or_else(|e| {
            error!("Failed to open {}: \"{}\"", path, e);
            quit::with_code(1);
        });

        let params = serde_yaml::from_reader::<_, Parameters>(file).unwrap_or_else(|e| {
            error!("Failed to parse parameters from {}: \"{}\"", path, e);
            quit::with_code(1);
        });

        info!(
            "Successfully loaded post-processing parameters from \"{}\": \n{:#?}",
            path, params
        );

        params
    };

    run_subcommand(matches.subcommand_name(), params).unwrap_or_else(|e| {
        error!("Error: \"{}\"", e);
        quit::with_code(1);
    });
}

fn run_subcommand(subcmd: Option<&str>, params: Parameters) -> Result<()> {
    let subcmd = match subcmd {
        Some(s) => s,
        None => bail!("No subcommand selected"),
    };

    info!("Starting {}", subcmd);

    match subcmd {
        "stations" => {
            let table = read_station_table(
                params.observed.metadata_path(),
                params.observed.header_lines,
                &params.observed.columns,
            )?;

            for station in &table.stations {
                info!(
                    "{} gauge {} at {} depth {}",
                    station.label, station.gauge_no, station.location, station.depth
                );
            }
            for row in &table.skipped {
                warn!("Skipped line {}: {}", row.line, row.reason);
            }
            info!(
                "{} active, {} inactive, {} skipped",
                table.stations.len(),
                table.inactive,
                table.skipped.len()
            );
        }
        "reconcile" => {
            let overlay = Reconciler::load(&params)?.reconcile()?;

            for exclusion in overlay.excluded() {
                warn!(
                    "Gauge {} not plotted, missing from {:?}",
                    exclusion.gauge_no, exclusion.missing
                );
            }

            if overlay.is_empty() {
                bail!("No gauge is present in every source");
            }

            let written = overlay.write_ascii(
                &params.environment.output_directory,
                &params.overlay.window,
            )?;
            for path in &written {
                info!("Wrote {:?}", path);
            }
        }
        _ => {
            // Should be unreachable due to clap catching this error
            bail!("Unrecognized subcommand");
        }
    }

    info!("Finished {}", subcmd);

    Ok(())
}
