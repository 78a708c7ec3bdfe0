// Dev utility: load the deterministic quota/snapshot fixtures into a DB.
//
// Usage:
//   cargo run --bin seed_fixture_db -- [db_path] [fixture_dir]
//
// fixture_dir defaults to tests/fixtures (quotas.csv + snapshots.csv).
// Loading the same fixtures twice leaves the DB unchanged (snapshots become stale).

use psm_quota_engine::app::{get_default_db_path, AppState};
use psm_quota_engine::importer::FixtureLoader;
use psm_quota_engine::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(get_default_db_path);
    let fixture_dir = args
        .next()
        .unwrap_or_else(|| "tests/fixtures".to_string());

    let state = AppState::new(db_path.clone())?;
    let loader = FixtureLoader::new(&state.quota_registry, &state.snapshot_ingester);
    let report = loader.load_dir(&fixture_dir)?;

    println!(
        "db={} quotas={} snapshots_accepted={} snapshots_stale={} rejected_rows={}",
        db_path,
        report.quotas_loaded,
        report.snapshots.accepted.len(),
        report.snapshots.stale.len(),
        report.rejected_rows.len()
    );
    Ok(())
}
