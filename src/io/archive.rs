use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::allele::Scheme;
use crate::error::Result;
use crate::tensor::Tensor;

/// 编码产物的来源信息（输入文件、命令行、生成时间）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveMeta {
    pub source_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
}

impl ArchiveMeta {
    /// Metadata stamped with the current command line and UTC time.
    pub fn now(source_file: impl Into<String>) -> Self {
        Self {
            source_file: Some(source_file.into()),
            build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
            build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// A per-request matrix together with the working list and scheme that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedArchive {
    pub meta: ArchiveMeta,
    pub scheme: Scheme,
    pub alleles: Vec<Option<String>>,
    pub encoded: Tensor,
}

impl EncodedArchive {
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut f = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut f, self)?;
        f.flush()?;
        let (n, l, v) = self.encoded.shape();
        info!(path = %path.display(), rows = n, length = l, width = v, "saved encoded alleles");
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let f = BufReader::new(File::open(path)?);
        let archive: Self = bincode::deserialize_from(f)?;
        Ok(archive)
    }
}
