use thiserror::Error;

use crate::engine::Outcome;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParam { name: &'static str, reason: String },

    #[error("unknown team: {0}")]
    UnknownTeam(String),

    #[error("non-finite {side} rating: {value}")]
    NonFiniteRating { side: &'static str, value: f64 },

    #[error("fair odds undefined: {outcome:?} probability is zero")]
    DegenerateOdds { outcome: Outcome },
}

impl PredictError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictError>;
