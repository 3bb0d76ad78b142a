/// quick start - minimal example to get started
use paymedia_rs::{parse_amount, parse_date, ParametersBuilder, Planner};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // two weeks of spending from a monday, recharging 500,000 at a time
    let params = ParametersBuilder::new()
        .start_date(parse_date("2025-06-02")?)
        .daily_budget(parse_amount("150.000")?)
        .recharge_amount(parse_amount("500.000")?)
        .rows(14)
        .build_from(parse_date("2025-06-02")?)?;

    let planner = Planner::new(params, Default::default())?;

    // print every row with its recharge, if any
    for row in planner.rows() {
        let recharge = row
            .recharge
            .as_ref()
            .map(|r| format!("request {} -> credit {}", r.amount, r.credited_on))
            .unwrap_or_default();
        println!("{}  {:>10}  {}", row.date, row.closing_balance.to_string(), recharge);
    }

    Ok(())
}
