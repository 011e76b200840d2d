//! 命令行子命令背后的执行逻辑：读输入、调用核心、写输出。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::allele::{AlleleEncoding, AlleleUniverse, Scheme};
use crate::io::archive::{ArchiveMeta, EncodedArchive};
use crate::io::features::FeatureTableResolver;
use crate::io::{fasta, table};
use crate::rank::{PercentRankTransform, RankTable};
use crate::tensor::Tensor;

#[derive(Debug, Clone)]
pub struct EncodeOpt {
    /// Allele sequences (CSV/TSV or FASTA), or a raw feature table.
    pub sequences: PathBuf,
    pub allele_col: String,
    pub sequence_col: String,
    /// Treat `sequences` as a raw per-allele numeric table.
    pub raw: bool,
    /// Table holding the working list; without it the whole universe is encoded.
    pub data: Option<PathBuf>,
    pub data_allele_col: String,
    pub scheme: Scheme,
    pub compact: bool,
    pub features_dir: Option<PathBuf>,
    pub output: PathBuf,
}

impl Default for EncodeOpt {
    fn default() -> Self {
        Self {
            sequences: PathBuf::new(),
            allele_col: "allele".to_string(),
            sequence_col: "sequence".to_string(),
            raw: false,
            data: None,
            data_allele_col: "allele".to_string(),
            scheme: Scheme::table(crate::alphabet::BLOSUM62),
            compact: false,
            features_dir: None,
            output: PathBuf::from("alleles.enc"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FitOpt {
    pub input: PathBuf,
    pub column: String,
    pub bins: usize,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RankOpt {
    pub ranks: PathBuf,
    pub input: PathBuf,
    pub column: String,
    pub out_column: String,
    pub output: PathBuf,
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn is_bincode(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("bin"))
}

fn load_universe(opt: &EncodeOpt) -> Result<AlleleUniverse> {
    let path = &opt.sequences;
    let universe = if opt.raw {
        let raw = table::read_raw_table(path, &opt.allele_col)
            .with_context(|| format!("cannot read raw allele table '{}'", display(path)))?;
        AlleleUniverse::from_raw(raw)?
    } else {
        let pairs = if fasta::is_fasta_path(path) {
            fasta::read_allele_fasta(path)
        } else {
            table::read_allele_sequences(path, &opt.allele_col, &opt.sequence_col)
        }
        .with_context(|| format!("cannot read allele sequences '{}'", display(path)))?;
        AlleleUniverse::from_pairs(pairs)?
    };
    Ok(match &opt.features_dir {
        Some(dir) => universe.with_resolver(Arc::new(FeatureTableResolver::new(dir))),
        None => universe,
    })
}

/// Encode the working list (or the whole universe) and save the archive.
pub fn run_encode(opt: &EncodeOpt) -> Result<EncodedArchive> {
    let universe = Arc::new(load_universe(opt)?);
    info!(alleles = universe.len() - 1, length = universe.padded_length(), "allele universe ready");

    let alleles: Vec<Option<String>> = match &opt.data {
        Some(path) => table::read_column(path, &opt.data_allele_col)
            .with_context(|| format!("cannot read working list '{}'", display(path)))?,
        None => std::iter::once(None)
            .chain(universe.alleles().iter().cloned().map(Some))
            .collect(),
    };

    let mut encoding = AlleleEncoding::builder()
        .optional_alleles(alleles.iter().map(Option::as_deref))
        .universe(universe)
        .build()
        .context("cannot resolve working list against the allele universe")?;
    if opt.compact {
        encoding = encoding.compact()?;
        info!(alleles = encoding.universe().len() - 1, "compacted universe");
    }

    let encoded = encoding
        .fixed_length_vector_encoded_sequences(&opt.scheme)
        .with_context(|| format!("cannot encode alleles with scheme '{}'", opt.scheme))?;
    let archive = EncodedArchive {
        meta: ArchiveMeta::now(display(&opt.sequences)),
        scheme: opt.scheme.clone(),
        alleles,
        encoded: Tensor::clone(&encoded),
    };
    archive
        .save_to_file(&opt.output)
        .with_context(|| format!("cannot write archive to '{}'", display(&opt.output)))?;
    Ok(archive)
}

/// Fit a percent-rank transform on a score column and save its table.
pub fn run_fit(opt: &FitOpt) -> Result<PercentRankTransform> {
    if opt.bins == 0 {
        anyhow::bail!("--bins must be at least 1");
    }
    let values = table::read_values(&opt.input, &opt.column)
        .with_context(|| {
            format!("cannot read column '{}' of '{}'", opt.column, display(&opt.input))
        })?;
    let mut transform = PercentRankTransform::new();
    transform
        .fit(&values, opt.bins)
        .with_context(|| format!("cannot fit percent ranks on '{}'", display(&opt.input)))?;

    let ranks = transform.serialize()?;
    let saved = if is_bincode(&opt.output) {
        ranks.save_to_file(&opt.output)
    } else {
        ranks.save_csv(&opt.output)
    };
    saved.with_context(|| format!("cannot write rank table to '{}'", display(&opt.output)))?;
    info!(values = values.len(), bins = opt.bins, "percent ranks fitted");
    Ok(transform)
}

/// Rank a score column with a saved transform, appending the result column.
pub fn run_rank(opt: &RankOpt) -> Result<Vec<f64>> {
    let rank_table = if is_bincode(&opt.ranks) {
        RankTable::load_from_file(&opt.ranks)
    } else {
        RankTable::load_csv(&opt.ranks)
    }
    .with_context(|| format!("cannot read rank table '{}'", display(&opt.ranks)))?;
    let transform = PercentRankTransform::deserialize(&rank_table)?;

    let values = table::read_values(&opt.input, &opt.column)
        .with_context(|| {
            format!("cannot read column '{}' of '{}'", opt.column, display(&opt.input))
        })?;
    let ranks = transform.transform(&values)?;
    table::append_column(&opt.input, &opt.output, &opt.out_column, &ranks)
        .with_context(|| format!("cannot write '{}'", display(&opt.output)))?;
    Ok(ranks)
}
