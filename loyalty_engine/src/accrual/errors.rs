use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AccrualApiError {
    #[error("Could not initialize accrual client: {0}")]
    Initialization(String),
    #[error("Accrual request failed: {0}")]
    Transport(String),
    #[error("Unexpected response from accrual service. Error {status}. {message}")]
    UnexpectedStatus { status: u16, message: String },
    #[error("Could not deserialize accrual response: {0}")]
    Json(String),
    #[error("Order {0} is PROCESSED but the accrual service did not report an accrual")]
    MissingAccrual(String),
}

impl From<reqwest::Error> for AccrualApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AccrualApiError::Json(e.to_string())
        } else {
            AccrualApiError::Transport(e.to_string())
        }
    }
}
