//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// SurveyTally - aggregate course-interest survey exports
///
/// Reads a survey export (CSV), computes frequency tables, tallies and
/// per-cohort breakdowns, and writes a JSON results document plus a
/// Markdown report. Can also serve a read-only dashboard.
///
/// Examples:
///   surveytally analyze --input responses.csv
///   surveytally analyze -i responses.csv -o out --format json --top 5
///   surveytally report --results out/results.json
///   surveytally serve --bind 0.0.0.0:5000
///   surveytally init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .surveytally.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Aggregate a survey export into results.json and report.md
    Analyze(AnalyzeArgs),

    /// Render report.md from an existing results.json
    Report(ReportArgs),

    /// Serve the dashboard and JSON endpoints
    Serve(ServeArgs),

    /// Generate a default .surveytally.toml configuration file
    InitConfig,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Survey export to read
    #[arg(short, long, value_name = "FILE", env = "SURVEYTALLY_INPUT")]
    pub input: Option<PathBuf>,

    /// Directory for results.json and report.md
    #[arg(short, long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Which outputs to write
    #[arg(long, value_enum, default_value = "both", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Courses listed per area
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Fail if any expected column is missing
    #[arg(long)]
    pub strict: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    /// Results document to render
    ///
    /// Defaults to results.json in the output directory
    #[arg(long, value_name = "FILE")]
    pub results: Option<PathBuf>,

    /// Where to write the report
    ///
    /// Defaults to report.md in the output directory
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory used for the defaults above
    #[arg(short = 'd', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Survey export to read
    #[arg(short, long, value_name = "FILE", env = "SURVEYTALLY_INPUT")]
    pub input: Option<PathBuf>,

    /// Directory holding results.json
    #[arg(short, long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, value_name = "ADDR", env = "SURVEYTALLY_BIND")]
    pub bind: Option<String>,

    /// Fail if any expected column is missing
    #[arg(long)]
    pub strict: bool,
}

/// Outputs written by `analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// results.json only
    Json,
    /// report.md only
    Markdown,
    /// Both files (default)
    #[default]
    Both,
}

impl OutputFormat {
    pub fn writes_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }

    pub fn writes_markdown(self) -> bool {
        matches!(self, OutputFormat::Markdown | OutputFormat::Both)
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Analyze(a) => {
                if a.top == Some(0) {
                    return Err("--top must be at least 1".to_string());
                }
            }
            Command::Serve(s) => {
                if let Some(ref bind) = s.bind {
                    if bind.parse::<SocketAddr>().is_err() {
                        return Err(format!(
                            "Bind address must look like HOST:PORT (e.g. 127.0.0.1:5000), got '{}'",
                            bind
                        ));
                    }
                }
            }
            Command::Report(_) | Command::InitConfig => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            command,
            config: None,
            verbose: false,
            quiet: false,
        }
    }

    fn analyze() -> AnalyzeArgs {
        AnalyzeArgs {
            input: None,
            output_dir: None,
            format: OutputFormat::Both,
            top: None,
            strict: false,
        }
    }

    fn serve(bind: &str) -> ServeArgs {
        ServeArgs {
            input: None,
            output_dir: None,
            bind: Some(bind.to_string()),
            strict: false,
        }
    }

    #[test]
    fn test_parse_subcommands() {
        let args = Args::try_parse_from([
            "surveytally",
            "-v",
            "analyze",
            "-i",
            "data.csv",
            "--format",
            "json",
            "--top",
            "3",
        ])
        .unwrap();
        assert!(args.verbose);
        match args.command {
            Command::Analyze(a) => {
                assert_eq!(a.input, Some(PathBuf::from("data.csv")));
                assert_eq!(a.format, OutputFormat::Json);
                assert_eq!(a.top, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let args = Args::try_parse_from(["surveytally", "init-config"]).unwrap();
        assert!(matches!(args.command, Command::InitConfig));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::Analyze(analyze()));
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_top_zero() {
        let mut a = analyze();
        a.top = Some(0);
        assert!(make_args(Command::Analyze(a)).validate().is_err());
    }

    #[test]
    fn test_validation_bind() {
        assert!(make_args(Command::Serve(serve("127.0.0.1:5000")))
            .validate()
            .is_ok());
        assert!(make_args(Command::Serve(serve("localhost")))
            .validate()
            .is_err());
    }

    #[test]
    fn test_output_format() {
        assert!(OutputFormat::Both.writes_json());
        assert!(OutputFormat::Both.writes_markdown());
        assert!(!OutputFormat::Json.writes_markdown());
        assert!(!OutputFormat::Markdown.writes_json());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
