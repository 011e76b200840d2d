use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use mhc_prep::allele::Scheme;
use mhc_prep::pipeline::{self, EncodeOpt, FitOpt, RankOpt};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "mhc-prep",
    author,
    version,
    about = "Allele encodings and percent-rank calibration for MHC training data",
    arg_required_else_help = true
)]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode the alleles of a dataset into a fixed-length matrix
    Encode {
        /// Allele sequences: CSV/TSV table or FASTA
        sequences: PathBuf,
        /// Dataset whose allele column is the working list (whole universe if omitted)
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Output archive (bincode)
        #[arg(short, long, default_value = "alleles.enc")]
        output: PathBuf,
        /// BLOSUM62, one-hot, raw, or external:<name>
        #[arg(short, long, default_value = "BLOSUM62")]
        scheme: String,
        #[arg(long = "allele-col", default_value = "allele")]
        allele_col: String,
        #[arg(long = "sequence-col", default_value = "sequence")]
        sequence_col: String,
        #[arg(long = "data-allele-col", default_value = "allele")]
        data_allele_col: String,
        /// Sequences file is a raw per-allele numeric table
        #[arg(long)]
        raw: bool,
        /// Restrict the universe to alleles used by the dataset
        #[arg(long)]
        compact: bool,
        /// Directory of <name>.csv feature tables for external:<name> schemes
        #[arg(long = "features-dir")]
        features_dir: Option<PathBuf>,
    },
    /// Fit a percent-rank transform on a score column
    FitRanks {
        /// Table holding the score population
        input: PathBuf,
        #[arg(short, long, default_value = "score")]
        column: String,
        #[arg(short, long, default_value_t = 1000)]
        bins: usize,
        /// Rank table (.csv, or .bin for bincode)
        #[arg(short, long, default_value = "ranks.csv")]
        output: PathBuf,
    },
    /// Append percent ranks of a score column using a fitted rank table
    Rank {
        /// Rank table written by fit-ranks
        #[arg(short, long)]
        ranks: PathBuf,
        input: PathBuf,
        #[arg(short, long, default_value = "score")]
        column: String,
        #[arg(long = "out-column", default_value = "percent_rank")]
        out_column: String,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn setup_logging(verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(if verbose { "debug" } else { "info" })
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    match cli.command {
        Commands::Encode {
            sequences,
            data,
            output,
            scheme,
            allele_col,
            sequence_col,
            data_allele_col,
            raw,
            compact,
            features_dir,
        } => {
            let opt = EncodeOpt {
                sequences,
                allele_col,
                sequence_col,
                raw,
                data,
                data_allele_col,
                scheme: Scheme::from(scheme.as_str()),
                compact,
                features_dir,
                output,
            };
            let archive = pipeline::run_encode(&opt)?;
            let (n, l, v) = archive.encoded.shape();
            println!("encoded: {} x {} x {}", n, l, v);
            println!("archive saved: {}", opt.output.display());
            Ok(())
        }
        Commands::FitRanks { input, column, bins, output } => {
            let opt = FitOpt { input, column, bins, output };
            pipeline::run_fit(&opt)?;
            println!("rank table saved: {}", opt.output.display());
            Ok(())
        }
        Commands::Rank { ranks, input, column, out_column, output } => {
            let opt = RankOpt { ranks, input, column, out_column, output };
            let ranked = pipeline::run_rank(&opt)?;
            println!("ranked: {}", ranked.len());
            println!("output: {}", opt.output.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_encode() {
        let cli = Cli::parse_from([
            "mhc-prep", "encode", "seqs.csv", "-d", "data.csv", "--compact", "-s", "one-hot",
        ]);
        match cli.command {
            Commands::Encode { sequences, data, scheme, compact, .. } => {
                assert_eq!(sequences, PathBuf::from("seqs.csv"));
                assert_eq!(data, Some(PathBuf::from("data.csv")));
                assert_eq!(Scheme::from(scheme.as_str()), Scheme::table("one-hot"));
                assert!(compact);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parse_fit_defaults() {
        let cli = Cli::parse_from(["mhc-prep", "-v", "fit-ranks", "scores.csv"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::FitRanks { bins, column, output, .. } => {
                assert_eq!(bins, 1000);
                assert_eq!(column, "score");
                assert_eq!(output, PathBuf::from("ranks.csv"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
