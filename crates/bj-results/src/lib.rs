//! bj-results: summary tables, CSV export and plot rendering.

pub mod export;
mod font_safe;
pub mod plot;
pub mod types;

pub use export::{
    read_summary, read_summary_csv, write_summary, write_summary_csv, write_trajectory,
    write_trajectory_csv,
};
pub use plot::{PlotFormat, render_plots};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Plotting error: {0}")]
    Plot(String),

    #[error("Nothing to export: {what}")]
    Empty { what: String },
}
