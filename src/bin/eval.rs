//! Evaluation CLI: mean NDCG@K of a predicted ranking against ground-truth relevance.

use anyhow::Context;
use clap::Parser;
use embedrank::eval::evaluator::DEFAULT_K;
use embedrank::RankingEvaluator;
use std::path::PathBuf;

/// Score predicted query/passage relevance against the ground truth.
#[derive(Parser, Debug)]
#[command(name = "eval")]
struct Args {
    /// Ground-truth TSV with question-id, passage-id and score columns.
    #[arg(long = "true", value_name = "FILE")]
    truth: PathBuf,

    /// Predicted TSV with the same columns; results.txt is written next to it.
    #[arg(long, value_name = "FILE")]
    pred: PathBuf,

    /// Rank cutoff for NDCG.
    #[arg(long, default_value_t = DEFAULT_K)]
    k: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();
    let report = RankingEvaluator::new(args.k)
        .evaluate_files(&args.truth, &args.pred)
        .with_context(|| {
            format!(
                "Evaluation of {} against {} failed",
                args.pred.display(),
                args.truth.display()
            )
        })?;

    println!("{}", report.summary());
    report.write_beside(&args.pred)?;
    Ok(())
}
