//! Backtest command implementation

use anyhow::Result;
use tracing::info;
use triple_reversal::backtest::Backtester;

use crate::RunArgs;

pub fn run(args: RunArgs, show_intents: bool) -> Result<()> {
    info!("Starting backtest");

    let setup = super::prepare(&args)?;
    let mut backtester = Backtester::new(setup.params, setup.window)?;

    info!("Running backtest...");
    let report = backtester.run(&setup.bars);

    println!("\n{}", "=".repeat(60));
    println!("BACKTEST RESULTS");
    println!("{}", "=".repeat(60));
    println!("Bars Processed:     {}", report.bars_processed);
    if let (Some(first), Some(last)) = (report.first_bar, report.last_bar) {
        println!(
            "Data Range:         {} .. {}",
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        );
    }
    println!("Entry Window:       {}", setup.window);
    println!("Signal Mode:        {:?}", setup.params.mode);
    println!("Warm-up Bars:       {}", setup.params.warm_up_bars());
    println!("{}", "-".repeat(60));
    println!("Enter Long:         {}", report.counts.enter_long);
    println!("Enter Short:        {}", report.counts.enter_short);
    println!("Close Long:         {}", report.counts.close_long);
    println!("Close Short:        {}", report.counts.close_short);
    println!("Total Intents:      {}", report.counts.total());
    println!("{}", "-".repeat(60));
    println!("Final Position:     {:?}", report.final_position.state);
    if let Some(price) = report.final_position.entry_price {
        println!("Entry Price:        {:.5}", price);
    }
    println!("{}", "=".repeat(60));

    if show_intents {
        println!();
        for intent in &report.intents {
            println!(
                "{}  {:<11} @ {:.5} x {}",
                intent.timestamp.format("%Y-%m-%d %H:%M"),
                intent.kind,
                intent.price,
                intent.quantity
            );
        }
    }

    report.export(&setup.results_dir)?;

    info!("Backtest completed successfully");
    Ok(())
}
