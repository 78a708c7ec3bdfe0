// Dev utility: run one quota monitoring cycle and print the report as JSON.
//
// Usage:
//   cargo run --bin run_quota_cycle -- [db_path] [feed_csv]
//
// Without a feed file the cycle evaluates the snapshots already stored in the DB.

use psm_quota_engine::app::{get_default_db_path, AppState};
use psm_quota_engine::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(get_default_db_path);
    let feed_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let state = AppState::new(db_path)?;
    let report = match feed_path {
        Some(path) => state.monitor_api.run_cycle_from_feed(&path).await?,
        None => state.monitor_api.run_cycle(&[]).await?,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
