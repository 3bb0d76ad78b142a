/// time control - defaults follow the injected clock
use paymedia_rs::{Planner, SafeTimeProvider, TimeSource};
use chrono::{Duration, TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== time control ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let mut planner = Planner::with_defaults(&time);
    println!("planning from {}", planner.parameters().start_date);
    println!("recharges: {}\n", planner.ledger().recharges().count());

    // a month later the owner resets to a fresh plan starting that day
    controller.advance(Duration::days(30));
    planner.restore_defaults(&time);
    println!("planning from {}", planner.parameters().start_date);
    println!("recharges: {}", planner.ledger().recharges().count());

    Ok(())
}
