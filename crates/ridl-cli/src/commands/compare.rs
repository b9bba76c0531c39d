use crate::cli::CompareArgs;
use crate::config;
use crate::error::{CliError, Result};
use ridlpp::engine::error::EngineError;
use ridlpp::engine::ranking::{RankPair, compare_rankings};
use std::fs::File;
use tracing::info;

pub fn run(args: CompareArgs) -> Result<()> {
    let app_config = config::load_app_config(&args.config)?;
    let first = super::parse_selection(&args.first_metric, args.first_normalised)?;
    let second = super::parse_selection(&args.second_metric, args.second_normalised)?;

    let series = super::assemble_series(&app_config)?;
    if series.is_empty() {
        println!("No atoms were matched across every dataset; nothing to compare.");
        return Ok(());
    }

    let paired = compare_rankings(&series, first, second).map_err(EngineError::from)?;

    println!("--------------------------------------------------------------------");
    println!(
        "Comparing {} against {} rankings:",
        first.label(),
        second.label()
    );
    if paired.is_empty() {
        println!("No atom-type groups are present in both rankings.");
        return Ok(());
    }
    println!(
        "{} atom-type group(s) present in both rankings.",
        paired.pairs().len()
    );
    if let Some(rho) = spearman_rho(paired.pairs()) {
        println!("Spearman rank correlation: {:.3}", rho);
    }

    std::fs::create_dir_all(&app_config.output_dir)?;
    let out_path = app_config.output_dir.join(format!(
        "{}-rankcompare-{}-{}-vs-{}-{}.csv",
        app_config.series_name,
        first.metric,
        super::variant_slug(first.variant),
        second.metric,
        super::variant_slug(second.variant)
    ));
    let file = File::create(&out_path)?;
    paired.write_csv(file).map_err(|e| {
        CliError::Other(anyhow::anyhow!("Failed to write comparison CSV: {}", e))
    })?;
    info!("Paired ranks written to {}", out_path.display());
    println!("Paired ranks written to {}", out_path.display());

    Ok(())
}

/// Spearman rank correlation over the paired ranks. The joined rank values
/// within each ranking are unique, so the tie-free formula applies.
fn spearman_rho(pairs: &[RankPair]) -> Option<f64> {
    let n = pairs.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let sum_d_sq: f64 = pairs
        .iter()
        .map(|p| {
            let d = p.first_rank as f64 - p.second_rank as f64;
            d * d
        })
        .sum();
    Some(1.0 - 6.0 * sum_d_sq / (nf * (nf * nf - 1.0)))
}
