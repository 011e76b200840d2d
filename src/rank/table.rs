use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// One `(bin edge, cdf)` pair; the first and last entries carry no edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub bin_edge: Option<f64>,
    pub cdf: f64,
}

/// Serialized percent-rank transform: keys `[None] + edges + [None]`,
/// values the cdf.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RankTable {
    entries: Vec<RankEntry>,
}

impl RankTable {
    pub fn new(entries: Vec<RankEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 写出 `bin_edge,cdf` 两列 CSV，哨兵行的 bin_edge 为空。
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut w = csv::Writer::from_writer(writer);
        for entry in &self.entries {
            w.serialize(entry)?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut r = csv::Reader::from_reader(reader);
        let entries = r
            .deserialize()
            .collect::<std::result::Result<Vec<RankEntry>, csv::Error>>()?;
        Ok(Self { entries })
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.write_csv(File::create(path)?)?;
        info!(path = %path.display(), entries = self.entries.len(), "wrote rank table");
        Ok(())
    }

    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self> {
        Self::read_csv(File::open(path)?)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut f = File::create(path)?;
        bincode::serialize_into(&mut f, self)?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::open(path)?;
        let table: Self = bincode::deserialize_from(f)?;
        Ok(table)
    }
}
