use std::env;
use std::thread;
use std::time::Duration;

use dotenvy::dotenv;

use promo_engine::db::establish_connection_pool;
use promo_engine::repository::DieselRepository;
use promo_engine::services::vouchers;

/// Voucher expiry sweeper: periodically converts stale pending redemptions
/// to expired so reporting stays consistent. Verification performs the same
/// transition lazily, so the sweep is hygiene, not correctness.
fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok(); // Load .env file

    let database_url = env::var("DATABASE_URL").unwrap_or("app.db".to_string());
    let interval = env::var("SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(300);

    let pool = match establish_connection_pool(&database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    let repo = DieselRepository::new(pool);

    log::info!("Voucher expiry sweeper running every {interval}s");

    loop {
        let now = chrono::Local::now().naive_utc();
        match vouchers::expire_stale_redemptions(&repo, now) {
            Ok(0) => {}
            Ok(expired) => log::info!("Expired {expired} stale voucher redemptions"),
            Err(e) => log::error!("Voucher expiry sweep failed: {e}"),
        }
        thread::sleep(Duration::from_secs(interval));
    }
}
