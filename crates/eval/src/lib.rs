pub mod benchmark;
pub mod generator;
pub mod plots;

pub use benchmark::{BenchmarkConfig, BenchmarkResults, Benchmarker, ScenarioResults};
pub use generator::{Scenario, generate};
pub use plots::generate_plots;
