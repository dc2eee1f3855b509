use serde::{Deserialize, Serialize};

use crate::db_types::Points;

/// A request to spend points against an order, as posted by a user: `{"order": "2377225624", "sum": 751}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub order: String,
    pub sum: Points,
}

impl WithdrawalRequest {
    pub fn new<S: Into<String>>(order: S, sum: Points) -> Self {
        Self { order: order.into(), sum }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_withdrawal_request() {
        let req: WithdrawalRequest = serde_json::from_str(r#"{"order": "2377225624", "sum": 751.5}"#).unwrap();
        assert_eq!(req, WithdrawalRequest::new("2377225624", Points::from(75_150)));
        assert!(serde_json::from_str::<WithdrawalRequest>(r#"{"order": "2377225624", "sum": -1}"#).is_err());
    }
}
