//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.surveytally.toml` files.

use crate::report::AssemblyOptions;
use crate::survey::{LoadOptions, Schema, SurveyError};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".surveytally.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Survey export settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Header overrides for individual fields.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Narrative report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Dashboard server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory receiving `results.json` and `report.md`.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "output".to_string()
}

/// Survey export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path of the export.
    #[serde(default = "default_input_path")]
    pub path: String,

    /// Field delimiter (single ASCII character).
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Refuse exports that lack any known column.
    #[serde(default)]
    pub strict_schema: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            delimiter: default_delimiter(),
            strict_schema: false,
        }
    }
}

fn default_input_path() -> String {
    "responses.csv".to_string()
}

fn default_delimiter() -> char {
    ','
}

/// Header overrides, keyed by field (`cohort`, `modality`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Courses listed per area under `popular_courses`.
    #[serde(default = "default_top_courses")]
    pub top_courses: usize,

    /// Suggestions dropped as trivial negatives (case-insensitive).
    #[serde(default = "default_stoplist")]
    pub suggestion_stoplist: Vec<String>,

    /// Prior-experience answers counted as "yes".
    #[serde(default = "default_affirmative")]
    pub affirmative_answers: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_courses: default_top_courses(),
            suggestion_stoplist: default_stoplist(),
            affirmative_answers: default_affirmative(),
        }
    }
}

fn default_top_courses() -> usize {
    10
}

fn default_stoplist() -> Vec<String> {
    vec!["ninguna", "ninguno", "no", "none", "n/a", "-"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_affirmative() -> Vec<String> {
    vec!["Sí", "Si", "Yes"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Narrative report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Rows per ranked table.
    #[serde(default = "default_table_rows")]
    pub max_table_rows: usize,

    /// Suggestions quoted in the report.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            max_table_rows: default_table_rows(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

fn default_title() -> String {
    "Course Interest Survey Report".to_string()
}

fn default_table_rows() -> usize {
    5
}

fn default_max_suggestions() -> usize {
    10
}

/// Dashboard server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// How long a client may take to send its request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        use crate::cli::Command;

        match &args.command {
            Command::Analyze(a) => {
                if let Some(ref input) = a.input {
                    self.input.path = input.display().to_string();
                }
                if let Some(ref dir) = a.output_dir {
                    self.general.output_dir = dir.display().to_string();
                }
                if let Some(top) = a.top {
                    self.analysis.top_courses = top;
                }
                if a.strict {
                    self.input.strict_schema = true;
                }
            }
            Command::Report(r) => {
                if let Some(ref dir) = r.output_dir {
                    self.general.output_dir = dir.display().to_string();
                }
            }
            Command::Serve(s) => {
                if let Some(ref input) = s.input {
                    self.input.path = input.display().to_string();
                }
                if let Some(ref dir) = s.output_dir {
                    self.general.output_dir = dir.display().to_string();
                }
                if let Some(ref bind) = s.bind {
                    self.server.bind = bind.clone();
                }
                if s.strict {
                    self.input.strict_schema = true;
                }
            }
            Command::InitConfig => {}
        }
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if !self.input.delimiter.is_ascii() {
            bail!(
                "input.delimiter must be a single ASCII character, got '{}'",
                self.input.delimiter
            );
        }
        if self.analysis.top_courses == 0 {
            bail!("analysis.top_courses must be at least 1");
        }
        if self.report.max_table_rows == 0 {
            bail!("report.max_table_rows must be at least 1");
        }
        if self.server.request_timeout_ms == 0 {
            bail!("server.request_timeout_ms must be at least 1");
        }
        Ok(())
    }

    pub fn input_path(&self) -> PathBuf {
        PathBuf::from(&self.input.path)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.general.output_dir)
    }

    /// Field-to-header mapping with configured overrides applied.
    pub fn schema(&self) -> Result<Schema, SurveyError> {
        Schema::with_overrides(&self.schema.columns)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            // validate() guarantees ASCII
            delimiter: self.input.delimiter as u8,
            strict: self.input.strict_schema,
        }
    }

    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            top_courses: self.analysis.top_courses,
            suggestion_stoplist: self.analysis.suggestion_stoplist.clone(),
            affirmative_answers: self.analysis.affirmative_answers.clone(),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{AnalyzeArgs, Args, Command, OutputFormat};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output_dir, "output");
        assert_eq!(config.analysis.top_courses, 10);
        assert!(config
            .analysis
            .suggestion_stoplist
            .contains(&"ninguna".to_string()));
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output_dir = "reports"

[input]
path = "export.csv"
delimiter = ";"

[schema.columns]
cohort = "Semester"

[analysis]
top_courses = 3

[server]
bind = "0.0.0.0:8080"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output_dir, "reports");
        assert_eq!(config.input.path, "export.csv");
        assert_eq!(config.load_options().delimiter, b';');
        assert_eq!(config.analysis.top_courses, 3);
        assert_eq!(config.report.max_table_rows, 5);
        assert_eq!(config.server.bind, "0.0.0.0:8080");

        let schema = config.schema().unwrap();
        assert_eq!(schema.header(crate::survey::Field::Cohort), "Semester");
    }

    #[test]
    fn test_validate_rejects_non_ascii_delimiter() {
        let mut config = Config::default();
        config.input.delimiter = '¦';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let args = Args {
            command: Command::Analyze(AnalyzeArgs {
                input: Some(PathBuf::from("other.csv")),
                output_dir: None,
                format: OutputFormat::Both,
                top: Some(4),
                strict: true,
            }),
            config: None,
            verbose: false,
            quiet: false,
        };

        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(config.input.path, "other.csv");
        assert_eq!(config.general.output_dir, "output");
        assert_eq!(config.analysis.top_courses, 4);
        assert!(config.input.strict_schema);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[input]"));
        assert!(toml_str.contains("[server]"));
        // Verbosity is a command-line flag only.
        assert!(!toml_str.contains("verbose"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.analysis.top_courses, 10);
    }
}
