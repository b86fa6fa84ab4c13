/*!
 * Sync Hazards - Main Entry Point
 *
 * Runs both demonstrations:
 * - Lost updates on an unsynchronized counter, then the synchronized fix
 * - Deadlock from reversed lock order, then the ordered fix
 */

use anyhow::{ensure, Result};
use miette::Diagnostic;
use tracing::info;

use sync_hazards::scenarios::{run_lock_ordering, run_lost_update};
use sync_hazards::{init_tracing, DemoConfig};

fn main() -> Result<()> {
    init_tracing();

    let config = DemoConfig::from_env().unwrap_or_else(|err| exit_with_diagnostic(err));
    info!(?config, "Sync hazards demo starting");

    let lost_update = run_lost_update(&config).unwrap_or_else(|err| exit_with_diagnostic(err));
    info!(
        expected = lost_update.expected,
        unsynchronized = lost_update.unsynchronized.observed,
        synchronized = lost_update.synchronized.observed,
        "Lost-update scenario complete"
    );

    let lock_ordering =
        run_lock_ordering(&config).unwrap_or_else(|err| exit_with_diagnostic(err));
    info!(
        naive_deadlocked = lock_ordering.naive.deadlock_detected,
        ordered_deadlocked = lock_ordering.ordered.deadlock_detected,
        "Lock-ordering scenario complete"
    );

    if config.report_json {
        let report = serde_json::json!({
            "config": config,
            "lost_update": lost_update,
            "lock_ordering": lock_ordering,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    ensure!(
        lost_update.synchronized_exact(),
        "synchronized counter observed {} of {} increments",
        lost_update.synchronized.observed,
        lost_update.expected
    );
    ensure!(
        !lock_ordering.ordered.deadlock_detected && lock_ordering.ordered.completed == 2,
        "ordered lock pair did not complete: {:?}",
        lock_ordering.ordered
    );

    info!("All scenarios behaved as expected");
    Ok(())
}

/// Print the error with its diagnostic code and help, then exit
fn exit_with_diagnostic<E: Diagnostic + Send + Sync + 'static>(err: E) -> ! {
    eprintln!("{:?}", miette::Report::new(err));
    std::process::exit(2);
}
