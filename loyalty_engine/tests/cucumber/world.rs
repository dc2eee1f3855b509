use std::collections::HashMap;

use cucumber::World;
use log::*;
use loyalty_engine::{
    db_types::Withdrawal,
    order_objects::UploadOutcome,
    test_utils::{
        prepare_env::{create_database, random_db_path, run_migrations},
        ScriptedAccrualService,
    },
    BalanceApi,
    BalanceApiError,
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct LoyaltyWorld {
    pub system: Option<LoyaltySystem>,
}

#[derive(Debug)]
pub struct LoyaltySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub balances: BalanceApi<SqliteDatabase>,
    pub accrual: ScriptedAccrualService,
    pub users: HashMap<String, i64>,
    pub last_upload: Option<Result<UploadOutcome, OrderFlowError>>,
    pub last_withdrawal: Option<Result<Withdrawal, BalanceApiError>>,
}

impl LoyaltyWorld {
    pub fn system(&self) -> &LoyaltySystem {
        self.system.as_ref().expect("System not initialised")
    }

    pub fn system_mut(&mut self) -> &mut LoyaltySystem {
        self.system.as_mut().expect("System not initialised")
    }
}

impl LoyaltySystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let orders = OrderFlowApi::new(db.clone());
        let balances = BalanceApi::new(db.clone());
        Self {
            db_path: url,
            db,
            orders,
            balances,
            accrual: ScriptedAccrualService::new(),
            users: HashMap::new(),
            last_upload: None,
            last_withdrawal: None,
        }
    }

    pub fn user_id(&self, login: &str) -> i64 {
        *self.users.get(login).unwrap_or_else(|| panic!("No user named {login}"))
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
