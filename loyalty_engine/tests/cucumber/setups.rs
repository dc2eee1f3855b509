use cucumber::given;
use loyalty_engine::{db_types::Points, BalanceManagement};

use crate::cucumber::{world::LoyaltySystem, LoyaltyWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut LoyaltyWorld) {
    let system = LoyaltySystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a user named {word}")]
async fn create_user(world: &mut LoyaltyWorld, login: String) {
    let sys = world.system_mut();
    let account = sys.balances.create_account(&login).await.expect("Error creating user");
    sys.users.insert(login, account.id);
}

#[given(expr = "{word} has {float} points")]
async fn seed_balance(world: &mut LoyaltyWorld, login: String, amount: f64) {
    let sys = world.system();
    let amount = Points::try_from(amount).expect("Invalid amount");
    sys.db.credit_balance(sys.user_id(&login), amount).await.expect("Error crediting balance");
}
