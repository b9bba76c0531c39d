use crate::cli::RankArgs;
use crate::config;
use crate::error::{CliError, Result};
use ridlpp::engine::error::EngineError;
use ridlpp::engine::ranking::{DamageRankEntry, DamageRanker, RankSelection};
use std::fs::File;
use tracing::info;

pub fn run(args: RankArgs) -> Result<()> {
    let app_config = config::load_app_config(&args.config)?;
    let selection = super::parse_selection(&args.metric, args.normalised)?;

    let series = super::assemble_series(&app_config)?;
    if series.is_empty() {
        println!("No atoms were matched across every dataset; nothing to rank.");
        return Ok(());
    }

    let mut ranker = DamageRanker::new(&series);
    ranker
        .calculate_ranks(selection.metric, selection.variant)
        .map_err(EngineError::from)?;
    let entries = ranker.damage_ranks(args.lines).map_err(EngineError::from)?;

    print_ranking(selection, entries);

    std::fs::create_dir_all(&app_config.output_dir)?;
    let out_path = app_config.output_dir.join(format!(
        "{}-ranking-{}-{}.csv",
        app_config.series_name,
        selection.metric,
        super::variant_slug(selection.variant)
    ));
    let file = File::create(&out_path)?;
    if let Some(ranking) = ranker.ranking() {
        ranking.write_csv(file).map_err(|e| {
            CliError::Other(anyhow::anyhow!("Failed to write ranking CSV: {}", e))
        })?;
    }
    info!("Ranking written to {}", out_path.display());
    println!("Ranking written to {}", out_path.display());

    Ok(())
}

fn print_ranking(selection: RankSelection, entries: &[DamageRankEntry]) {
    println!("--------------------------------------------------------------------");
    println!("Ordering of damage with {} metric as follows:", selection.label());
    for entry in entries {
        println!(
            "{}\t{} {} {}\tSlope: {:.4}\tStd Dev: {:.4}",
            entry.rank,
            entry.key.residue_name,
            entry.key.atom_name,
            entry.key.binding,
            entry.mean_slope,
            entry.slope_std_dev
        );
    }
}
