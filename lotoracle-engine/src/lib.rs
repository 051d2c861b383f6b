pub mod analysis;
pub mod confidence;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod genetic;
pub mod intelligence;
pub mod models;
pub mod oracle;
pub mod sampler;
pub mod seed;
pub mod yearly;

pub use config::OracleConfig;
pub use dataset::HistoricalDataset;
pub use error::{OracleError, Result};
pub use oracle::{Engine, PredictionResult, Strategy};
