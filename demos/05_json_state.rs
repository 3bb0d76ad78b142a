/// json state - persist a planner and export its ledger
use paymedia_rs::{parse_amount, parse_date, Planner, SafeTimeProvider, TimeSource};
use chrono::{TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== json state serialization ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap()
    ));

    let mut planner = Planner::with_defaults(&time);
    planner.set_rows(10)?;

    // stage 1: a trip on wednesday costs more than the usual budget
    planner.set_special_consumption(parse_date("2025-06-04")?, parse_amount("320.000")?)?;

    // stage 2: a manual recharge on tuesday, settling with the default lag
    let mut recharge = planner.draft_special_recharge(parse_date("2025-06-03")?);
    recharge.amount = parse_amount("250.000")?;
    planner.upsert_special_recharge(recharge, false)?;

    // stage 3: a bank holiday on thursday
    planner.toggle_holiday(parse_date("2025-06-05")?);

    let stored = planner.snapshot().to_json_pretty()?;
    println!("stored state:");
    println!("-------------");
    println!("{}\n", stored);

    // a host restart rebuilds the same ledger from the stored state
    let restored = Planner::restore(Some(&stored), &time);
    assert_eq!(restored.ledger(), planner.ledger());

    println!("ledger export:");
    println!("--------------");
    println!("{}", restored.json());

    for event in planner.take_events() {
        println!("{:?}", event);
    }

    Ok(())
}
