use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Unrecognised EPC rating: {0}")]
    InvalidEpcRating(String),

    #[error("Unrecognised flood risk: {0}")]
    InvalidFloodRisk(String),
}

pub type Result<T> = std::result::Result<T, CommonError>;
