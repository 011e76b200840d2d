use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::error::{PrepError, Result};

/// 一条等位基因序列记录：`>名称 描述` + 多行序列。
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleRecord {
    pub name: String,
    pub desc: Option<String>,
    pub sequence: String,
}

pub struct FastaReader<R: BufRead> {
    reader: R,
    line: String,
    done: bool,
    pending_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            done: false,
            pending_header: None,
        }
    }

    fn read_line(&mut self) -> Result<bool> {
        self.line.clear();
        Ok(self.reader.read_line(&mut self.line)? > 0)
    }

    pub fn next_record(&mut self) -> Result<Option<AlleleRecord>> {
        if self.done {
            return Ok(None);
        }

        let header = match self.pending_header.take() {
            Some(h) => h,
            None => loop {
                if !self.read_line()? {
                    self.done = true;
                    return Ok(None);
                }
                if let Some(h) = self.line.strip_prefix('>') {
                    break h.trim().to_string();
                }
                if !self.line.trim().is_empty() {
                    return Err(PrepError::malformed(format!(
                        "sequence data before first header: '{}'",
                        self.line.trim()
                    )));
                }
            },
        };

        let mut parts = header.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or("").to_string();
        if name.is_empty() {
            return Err(PrepError::malformed("FASTA header without a name"));
        }
        let desc = parts
            .next()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let mut sequence = String::new();
        loop {
            if !self.read_line()? {
                self.done = true;
                break;
            }
            if let Some(h) = self.line.strip_prefix('>') {
                self.pending_header = Some(h.trim().to_string());
                break;
            }
            sequence.extend(
                self.line
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .map(|c| c.to_ascii_uppercase()),
            );
        }

        Ok(Some(AlleleRecord {
            name,
            desc,
            sequence,
        }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<AlleleRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// `.fa`, `.fasta`, `.faa` 视为 FASTA。
pub fn is_fasta_path(path: impl AsRef<Path>) -> bool {
    matches!(
        path.as_ref().extension().and_then(|e| e.to_str()),
        Some("fa" | "fasta" | "faa")
    )
}

/// Read `(allele, sequence)` pairs in file order.
pub fn read_allele_fasta(path: impl AsRef<Path>) -> Result<Vec<(String, String)>> {
    let path = path.as_ref();
    let reader = FastaReader::new(BufReader::new(File::open(path)?));
    let pairs = reader
        .map(|r| r.map(|rec| (rec.name, rec.sequence)))
        .collect::<Result<Vec<_>>>()?;
    info!(path = %path.display(), alleles = pairs.len(), "read allele sequences");
    Ok(pairs)
}
