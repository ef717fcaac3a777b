use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weather-summary-processor")]
#[command(about = "Extract daily station readings from monthly weather summaries and aggregate them per region")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Suppress progress output")]
    pub quiet: bool,

    #[arg(short, long, global = true, help = "Settings TOML file")]
    pub config: Option<PathBuf>,
}

/// Where the station location rows come from.
#[derive(Args, Clone)]
#[group(required = true, multiple = false)]
pub struct LocationSource {
    #[arg(long, help = "Local file of station location rows")]
    pub locations: Option<PathBuf>,

    #[arg(long, help = "URL of the station list page")]
    pub locations_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract observations, resolve stations and aggregate per region
    Run {
        #[arg(short, long, help = "Page text dump of the monthly summary")]
        pages: PathBuf,

        #[command(flatten)]
        locations: LocationSource,

        #[arg(short, long, help = "GeoJSON file of region polygons")]
        regions: PathBuf,

        #[arg(
            short,
            long,
            help = "Output directory [default: output/wx-summary-{YYMMDD}]"
        )]
        output_dir: Option<PathBuf>,

        #[arg(short, long, help = "Measurement to aggregate [default: from settings]")]
        measurement: Option<String>,
    },

    /// Extract the observation table only
    Extract {
        #[arg(short, long, help = "Page text dump of the monthly summary")]
        pages: PathBuf,

        #[arg(
            short,
            long,
            help = "Output directory [default: output/wx-summary-{YYMMDD}]"
        )]
        output_dir: Option<PathBuf>,
    },

    /// Parse the station location list only
    Locations {
        #[command(flatten)]
        locations: LocationSource,

        #[arg(
            short,
            long,
            help = "Output directory [default: output/wx-summary-{YYMMDD}]"
        )]
        output_dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_location_sources_are_exclusive() {
        let result = Cli::try_parse_from([
            "weather-summary-processor",
            "locations",
            "--locations",
            "rows.txt",
            "--locations-url",
            "https://example.org/stations",
        ]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "weather-summary-processor",
            "--quiet",
            "run",
            "--pages",
            "jan.txt",
            "--locations",
            "rows.txt",
            "--regions",
            "regions.geojson",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Run { .. }));
    }
}
