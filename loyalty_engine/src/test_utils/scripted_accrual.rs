use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use log::*;

use crate::{
    accrual::{AccrualApiError, AccrualOrderStatus, AccrualService, AccrualStatus, Good},
    db_types::{OrderNumber, Points},
};

#[derive(Debug, Default)]
struct Script {
    rejected_registrations: HashSet<OrderNumber>,
    statuses: HashMap<OrderNumber, Result<AccrualOrderStatus, AccrualApiError>>,
    registered: Vec<OrderNumber>,
    status_queries: Vec<OrderNumber>,
}

/// An accrual service whose answers are set up in advance by the test.
///
/// By default every registration is accepted and every status query answers "not registered" (`None`). Clones share
/// the same script, so a test can keep a handle to adjust responses while a worker holds another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAccrualService {
    script: Arc<Mutex<Script>>,
}

impl ScriptedAccrualService {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registration of `number` fails with a transport error until [`Self::accept_registration`] is called.
    pub fn reject_registration<N: Into<OrderNumber>>(&self, number: N) {
        self.script().rejected_registrations.insert(number.into());
    }

    pub fn accept_registration<N: Into<OrderNumber>>(&self, number: N) {
        self.script().rejected_registrations.remove(&number.into());
    }

    /// Status queries for `number` return the given status and accrual.
    pub fn set_status<N: Into<OrderNumber>>(&self, number: N, status: AccrualStatus, accrual: Option<Points>) {
        let number = number.into();
        let response = AccrualOrderStatus::new(number.clone(), status, accrual);
        self.script().statuses.insert(number, Ok(response));
    }

    /// Status queries for `number` fail with the given error.
    pub fn fail_status<N: Into<OrderNumber>>(&self, number: N, error: AccrualApiError) {
        self.script().statuses.insert(number.into(), Err(error));
    }

    /// Status queries for `number` go back to answering "not registered".
    pub fn clear_status<N: Into<OrderNumber>>(&self, number: N) {
        self.script().statuses.remove(&number.into());
    }

    /// Every successful registration, in the order they were made.
    pub fn registered_orders(&self) -> Vec<OrderNumber> {
        self.script().registered.clone()
    }

    /// Every status query, in the order they were made.
    pub fn status_queries(&self) -> Vec<OrderNumber> {
        self.script().status_queries.clone()
    }
}

impl AccrualService for ScriptedAccrualService {
    async fn register_order(&self, number: &OrderNumber, goods: &[Good]) -> Result<(), AccrualApiError> {
        let mut script = self.script();
        if script.rejected_registrations.contains(number) {
            return Err(AccrualApiError::Transport(format!("Scripted registration failure for {number}")));
        }
        trace!("🎭️ Registered {number} with {} goods", goods.len());
        script.registered.push(number.clone());
        Ok(())
    }

    async fn fetch_order_status(&self, number: &OrderNumber) -> Result<Option<AccrualOrderStatus>, AccrualApiError> {
        let mut script = self.script();
        script.status_queries.push(number.clone());
        match script.statuses.get(number) {
            Some(Ok(status)) => Ok(Some(status.clone())),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(None),
        }
    }
}
