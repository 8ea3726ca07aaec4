pub mod runner;
pub mod stats_report;

pub use runner::JobRunner;
pub use stats_report::StatsReportJob;
