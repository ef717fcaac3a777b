use crate::cli::args::{Cli, Commands, LocationSource};
use crate::error::{ProcessingError, Result};
use crate::models::RawPage;
use crate::processors::{Pipeline, PipelineInputs, RunReport};
use crate::readers::{LocationFetcher, LocationReader, PageReader, RegionReader};
use crate::settings::Settings;
use crate::utils::constants::{LOCATIONS_FILE, OBSERVATIONS_FILE};
use crate::utils::filename::generate_default_output_dir;
use crate::utils::progress::ProgressReporter;
use crate::writers::CsvWriter;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, Level};

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let settings = Settings::load(cli.config.as_deref())?;
    let progress = ProgressReporter::new_spinner("Starting...", cli.quiet);

    match cli.command {
        Commands::Run {
            pages,
            locations,
            regions,
            output_dir,
            measurement,
        } => {
            let mut settings = settings;
            if let Some(measurement) = measurement {
                settings.aggregate.measurement = measurement;
            }
            let output_dir = output_dir.unwrap_or_else(generate_default_output_dir);

            progress.println(&format!("Pages: {}", pages.display()));
            progress.println(&format!("Regions: {}", regions.display()));
            progress.println(&format!("Output directory: {}", output_dir.display()));

            let pipeline = Pipeline::new(settings)?;

            progress.stage("Reading inputs...");
            let inputs = PipelineInputs {
                pages: read_pages(&pages)?,
                location_rows: read_location_rows(&locations)?,
                regions: RegionReader::new(pipeline.settings().aggregate.region_name_property.clone())
                    .read_regions(&regions)?,
            };

            let output = pipeline.run(inputs, Some(&progress))?;

            progress.stage("Writing CSV files...");
            let written = CsvWriter::new().write_all(
                &output_dir,
                &output.observations,
                &output.locations,
                &output.resolution.stations,
                &output.aggregate.aggregates,
            )?;

            print_report(&progress, &output.report);
            for path in written {
                progress.println(&format!("Wrote {}", path.display()));
            }
        }

        Commands::Extract { pages, output_dir } => {
            let output_dir = output_dir.unwrap_or_else(generate_default_output_dir);
            let pipeline = Pipeline::new(settings)?;
            let mut report = RunReport::default();

            progress.stage("Extracting daily tables...");
            let observations = pipeline.extract_observations(&read_pages(&pages)?, &mut report)?;

            let path = output_dir.join(OBSERVATIONS_FILE);
            CsvWriter::new().write_observations(&observations, &path)?;
            progress.finish_with_message(&format!("Extracted {} observation rows", observations.len()));

            print_report(&progress, &report);
            progress.println(&format!("Wrote {}", path.display()));
        }

        Commands::Locations {
            locations,
            output_dir,
        } => {
            let output_dir = output_dir.unwrap_or_else(generate_default_output_dir);
            let pipeline = Pipeline::new(settings)?;
            let mut report = RunReport::default();

            progress.stage("Reading station locations...");
            let rows = read_location_rows(&locations)?;
            let parsed = pipeline.prepare_locations(&rows, &mut report);

            let path = output_dir.join(LOCATIONS_FILE);
            CsvWriter::new().write_locations(&parsed, &path)?;
            progress.finish_with_message(&format!("Parsed {} station locations", parsed.len()));

            print_report(&progress, &report);
            progress.println(&format!("Wrote {}", path.display()));
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let builder = tracing_subscriber::fmt().with_max_level(level).with_target(false);

    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    info!(verbose, "logging initialised");
    Ok(())
}

fn read_pages(path: &Path) -> Result<Vec<RawPage>> {
    let pages = PageReader::new().read_pages(path)?;
    info!(pages = pages.len(), path = %path.display(), "read page dump");
    Ok(pages)
}

fn read_location_rows(source: &LocationSource) -> Result<Vec<String>> {
    match (&source.locations, &source.locations_url) {
        (Some(path), _) => LocationReader::new().read_rows(path),
        (None, Some(url)) => LocationFetcher::new()?.fetch_rows(url),
        (None, None) => Err(ProcessingError::Config(
            "either --locations or --locations-url is required".to_string(),
        )),
    }
}

fn print_report(progress: &ProgressReporter, report: &RunReport) {
    progress.println(&format!("\n{}", report.generate_summary()));
    if report.has_issues() {
        progress.println(&format!("Completed with {} recorded issues", report.issue_count()));
    } else {
        progress.println("Completed with no recorded issues");
    }
}
