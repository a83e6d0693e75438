pub mod data_dir;
pub mod engine;
pub mod error;
pub mod export;
pub mod fixtures;
pub mod gameweek;
pub mod params;
pub mod ratings;

pub use engine::{Prediction, predict, predict_adjusted};
pub use error::PredictError;
pub use params::ModelParams;
