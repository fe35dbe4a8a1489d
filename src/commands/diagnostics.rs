//! Diagnostics export command

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use triple_reversal::{diagnostics, ReversalStrategy};

use crate::RunArgs;

pub fn run(args: RunArgs) -> Result<()> {
    let setup = super::prepare(&args)?;
    let mut strategy = ReversalStrategy::new(setup.params, setup.window)?;

    let points: Vec<_> = setup
        .bars
        .iter()
        .map(|bar| strategy.on_bar(bar).diagnostics)
        .collect();

    let dir = Path::new(&setup.results_dir);
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create results dir {}", dir.display()))?;
    let path = dir.join("diagnostics.csv");
    diagnostics::write_csv(&path, &points)?;

    info!("Wrote {} diagnostic points to {}", points.len(), path.display());
    Ok(())
}
