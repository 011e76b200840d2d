//! 百分位秩变换：用直方图拟合经验累积分布，再把任意分数映射到 [0, 100]。

pub mod histogram;
pub mod table;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PrepError, Result};

pub use table::{RankEntry, RankTable};

/// A fitted percent-rank lookup.
///
/// `bin_edges` has `B + 1` entries for `B` bins. `cdf` has `B + 3` entries:
/// two leading zeros, the cumulative bin percentages, and a trailing 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentRanks {
    bin_edges: Vec<f64>,
    cdf: Vec<f64>,
}

impl PercentRanks {
    /// Fit on `values` with `bins` equal-width bins.
    pub fn fit(values: &[f64], bins: usize) -> Result<Self> {
        let (counts, bin_edges) = histogram::histogram(values, bins)?;
        let total: u64 = counts.iter().sum();

        let mut cdf = Vec::with_capacity(bins + 3);
        cdf.push(0.0);
        cdf.push(0.0);
        let mut acc = 0.0;
        for &c in &counts {
            acc += c as f64 * 100.0 / total as f64;
            cdf.push(acc);
        }
        cdf.push(100.0);
        if cdf.iter().any(|v| v.is_nan()) {
            return Err(PrepError::degenerate("cumulative distribution is undefined"));
        }
        debug!(values = values.len(), bins, "fitted percent ranks");
        Ok(Self { bin_edges, cdf })
    }

    /// Rebuild from stored parts, checking the shape invariants.
    pub fn from_parts(bin_edges: Vec<f64>, cdf: Vec<f64>) -> Result<Self> {
        if bin_edges.len() < 2 {
            return Err(PrepError::malformed(format!(
                "need at least 2 bin edges, found {}",
                bin_edges.len()
            )));
        }
        if cdf.len() != bin_edges.len() + 2 {
            return Err(PrepError::malformed(format!(
                "{} bin edges need {} cdf entries, found {}",
                bin_edges.len(),
                bin_edges.len() + 2,
                cdf.len()
            )));
        }
        if bin_edges.iter().any(|e| !e.is_finite()) {
            return Err(PrepError::malformed("bin edges must be finite"));
        }
        if bin_edges.windows(2).any(|w| w[0] > w[1]) {
            return Err(PrepError::malformed("bin edges must be non-decreasing"));
        }
        if cdf.iter().any(|v| v.is_nan()) {
            return Err(PrepError::degenerate("cumulative distribution is undefined"));
        }
        Ok(Self { bin_edges, cdf })
    }

    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }

    pub fn cdf(&self) -> &[f64] {
        &self.cdf
    }

    pub fn bins(&self) -> usize {
        self.bin_edges.len() - 1
    }

    /// Percent rank of a single value.
    ///
    /// The cdf entry is picked by the left insertion index of `value` among
    /// the edges, so a value sitting exactly on an edge takes the lower
    /// side. Values at or below the lowest edge map to 0, values at or above
    /// the highest edge map to 100.
    pub fn rank(&self, value: f64) -> Result<f64> {
        if value.is_nan() {
            return Err(PrepError::invalid_value("cannot rank NaN"));
        }
        let last = self.cdf.len() - 1;
        if self.bin_edges.last().map_or(false, |&max| value >= max) {
            return Ok(self.cdf[last]);
        }
        let p = self.bin_edges.partition_point(|&e| e < value);
        Ok(self.cdf[p])
    }

    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        values.iter().map(|&v| self.rank(v)).collect()
    }

    pub fn to_table(&self) -> RankTable {
        let keys = std::iter::once(None)
            .chain(self.bin_edges.iter().copied().map(Some))
            .chain(std::iter::once(None));
        RankTable::new(
            keys.zip(self.cdf.iter().copied())
                .map(|(bin_edge, cdf)| RankEntry { bin_edge, cdf })
                .collect(),
        )
    }

    /// Inverse of [`to_table`](Self::to_table).
    pub fn from_table(table: &RankTable) -> Result<Self> {
        let entries = table.entries();
        if entries.len() < 4 {
            return Err(PrepError::malformed(format!(
                "rank table needs at least 4 entries, found {}",
                entries.len()
            )));
        }
        let inner = &entries[1..entries.len() - 1];
        let bin_edges = inner
            .iter()
            .enumerate()
            .map(|(i, e)| {
                e.bin_edge
                    .ok_or_else(|| PrepError::malformed(format!("entry {} has no bin edge", i + 1)))
            })
            .collect::<Result<Vec<f64>>>()?;
        let cdf = entries.iter().map(|e| e.cdf).collect();
        Self::from_parts(bin_edges, cdf)
    }
}

/// Write-once percent-rank transform.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PercentRankTransform {
    #[default]
    Unfit,
    Fit(PercentRanks),
}

impl PercentRankTransform {
    pub fn new() -> Self {
        Self::Unfit
    }

    /// Fit in place. Fitting an already fitted transform is an error.
    pub fn fit(&mut self, values: &[f64], bins: usize) -> Result<()> {
        if self.is_fit() {
            return Err(PrepError::config("percent rank transform is already fit"));
        }
        *self = Self::Fit(PercentRanks::fit(values, bins)?);
        Ok(())
    }

    pub fn is_fit(&self) -> bool {
        matches!(self, Self::Fit(_))
    }

    pub fn ranks(&self) -> Option<&PercentRanks> {
        match self {
            Self::Fit(ranks) => Some(ranks),
            Self::Unfit => None,
        }
    }

    fn fitted(&self) -> Result<&PercentRanks> {
        self.ranks()
            .ok_or_else(|| PrepError::config("percent rank transform is not fit"))
    }

    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        self.fitted()?.transform(values)
    }

    pub fn serialize(&self) -> Result<RankTable> {
        Ok(self.fitted()?.to_table())
    }

    pub fn deserialize(table: &RankTable) -> Result<Self> {
        Ok(Self::Fit(PercentRanks::from_table(table)?))
    }
}

impl From<PercentRanks> for PercentRankTransform {
    fn from(ranks: PercentRanks) -> Self {
        Self::Fit(ranks)
    }
}
