//! Results document assembly and rendering.

pub mod assembler;
pub mod dashboard;
pub mod generator;

pub use assembler::{assemble, AssemblyOptions};
pub use dashboard::render_dashboard;
pub use generator::{
    generate_markdown_report, read_results, write_atomic, write_results, ReportOptions,
};

/// File name of the results document inside the output directory.
pub const RESULTS_FILE: &str = "results.json";

/// File name of the narrative report inside the output directory.
pub const REPORT_FILE: &str = "report.md";
