use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize};

use crate::db_types::{OrderNumber, Points};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Good {
    pub description: String,
    pub price: f64,
}

/// Body of `POST {base}/api/orders`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterOrderRequest<'a> {
    pub order: &'a str,
    pub goods: &'a [Good],
}

/// The order status as reported by the accrual service. Status strings that this system does not know about are kept
/// verbatim in `Unknown`, so that they can be logged and retried rather than mapped onto the wrong state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualStatus {
    Registered,
    Processing,
    Processed,
    Invalid,
    Unknown(String),
}

impl From<&str> for AccrualStatus {
    fn from(s: &str) -> Self {
        match s {
            "REGISTERED" => Self::Registered,
            "PROCESSING" => Self::Processing,
            "PROCESSED" => Self::Processed,
            "INVALID" => Self::Invalid,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for AccrualStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

impl Display for AccrualStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registered => f.write_str("REGISTERED"),
            Self::Processing => f.write_str("PROCESSING"),
            Self::Processed => f.write_str("PROCESSED"),
            Self::Invalid => f.write_str("INVALID"),
            Self::Unknown(s) => write!(f, "unknown status '{s}'"),
        }
    }
}

/// Body of a `200 OK` response to `GET {base}/api/orders/{number}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccrualOrderStatus {
    pub order: OrderNumber,
    pub status: AccrualStatus,
    #[serde(default)]
    pub accrual: Option<Points>,
}

impl AccrualOrderStatus {
    pub fn new(order: OrderNumber, status: AccrualStatus, accrual: Option<Points>) -> Self {
        Self { order, status, accrual }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_processed() {
        let json = r#"{"order": "79927398713", "status": "PROCESSED", "accrual": 729.98}"#;
        let status: AccrualOrderStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.order.as_str(), "79927398713");
        assert_eq!(status.status, AccrualStatus::Processed);
        assert_eq!(status.accrual, Some(Points::from(72_998)));
    }

    #[test]
    fn deserialize_without_accrual() {
        let json = r#"{"order": "12345678903", "status": "REGISTERED"}"#;
        let status: AccrualOrderStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.status, AccrualStatus::Registered);
        assert!(status.accrual.is_none());
    }

    #[test]
    fn unknown_status_is_preserved() {
        let json = r#"{"order": "12345678903", "status": "ON_HOLD"}"#;
        let status: AccrualOrderStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.status, AccrualStatus::Unknown("ON_HOLD".into()));
    }

    #[test]
    fn register_request_shape() {
        let goods = vec![Good { description: "Kettle Bork".into(), price: 7000.0 }];
        let req = RegisterOrderRequest { order: "79927398713", goods: &goods };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"order": "79927398713", "goods": [{"description": "Kettle Bork", "price": 7000.0}]}));
    }
}
