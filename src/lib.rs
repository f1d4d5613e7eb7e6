// Library interface for trainload modules
// This allows integration tests and benches to access the core functionality

pub mod aggregate;
pub mod coaching;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod import;
pub mod load;
pub mod logging;
pub mod models;
pub mod pmc;
pub mod status;
pub mod summary;

// Re-export commonly used types for convenience
pub use models::*;
pub use aggregate::DailyAggregator;
pub use engine::{EngineConfig, EngineReport, TrainingLoadEngine};
pub use load::{LoadEstimate, LoadEstimator, LoadSource};
pub use pmc::{FormLag, PmcCalculator, PmcConfig};
pub use status::{ReadinessBand, StatusClassifier, StatusThresholds, TrainingStatus};
pub use error::{TrainLoadError, Result};
pub use logging::{LogConfig, LogLevel, LogFormat};
