//! Residue alphabets and per-symbol vector tables.
//!
//! An [`AlphabetProvider`] turns sequences into symbol indices and exposes
//! named tables mapping each symbol index to a fixed-width vector. The
//! allele encoder only depends on the trait; [`AminoAcids`] is the default
//! provider with BLOSUM62 and one-hot tables.

use std::fmt::Debug;

use crate::error::{PrepError, Result};
use crate::util::amino;

pub mod tables;

pub use tables::{BLOSUM62, ONE_HOT};

/// A named table of one vector per symbol index.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorTable {
    name: String,
    width: usize,
    data: Vec<f32>,
}

impl VectorTable {
    /// `data` holds `symbols * width` values, symbol-major.
    pub fn from_flat(name: impl Into<String>, width: usize, data: Vec<f32>) -> Result<Self> {
        let name = name.into();
        if width == 0 || data.len() % width != 0 {
            return Err(PrepError::shape(
                format!("a multiple of {} values in table '{}'", width, name),
                format!("{} values", data.len()),
            ));
        }
        Ok(Self { name, width, data })
    }

    pub fn from_rows<I>(name: impl Into<String>, width: usize, rows: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<[f32]>,
    {
        let name = name.into();
        if width == 0 {
            return Err(PrepError::shape(
                format!("non-zero width for table '{}'", name),
                "0",
            ));
        }
        let mut data = Vec::new();
        for (i, row) in rows.into_iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(PrepError::shape(
                    format!("{} values per symbol in table '{}'", width, name),
                    format!("{} values for symbol {}", row.len(), i),
                ));
            }
            data.extend_from_slice(row);
        }
        Ok(Self { name, width, data })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vector width `V`.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of symbols that have a row.
    #[inline]
    pub fn symbols(&self) -> usize {
        self.data.len() / self.width
    }

    #[inline]
    pub fn row(&self, symbol: usize) -> Option<&[f32]> {
        let start = symbol * self.width;
        self.data.get(start..start + self.width)
    }
}

/// Source of symbol indices and per-symbol vector tables.
pub trait AlphabetProvider: Debug + Send + Sync {
    /// Symbols in index order.
    fn alphabet(&self) -> &[u8];

    /// Filler symbol used to right-pad sequences.
    fn pad_symbol(&self) -> u8 {
        amino::PAD
    }

    /// Map every symbol of every sequence to its index in [`alphabet`](Self::alphabet).
    fn index_encode(&self, sequences: &[String]) -> Result<Vec<Vec<usize>>> {
        let alphabet = self.alphabet();
        sequences
            .iter()
            .map(|seq| {
                seq.bytes()
                    .map(|b| {
                        let upper = b.to_ascii_uppercase();
                        alphabet
                            .iter()
                            .position(|&s| s == upper)
                            .ok_or_else(|| PrepError::InvalidSymbol {
                                symbol: b as char,
                                sequence: seq.clone(),
                            })
                    })
                    .collect()
            })
            .collect()
    }

    /// Look up a table by name.
    fn scheme_table(&self, name: &str) -> Result<&VectorTable>;

    /// All names accepted by [`scheme_table`](Self::scheme_table).
    fn scheme_names(&self) -> Vec<String>;
}

/// The 21-symbol amino-acid alphabet with BLOSUM62 and one-hot tables.
#[derive(Debug, Clone)]
pub struct AminoAcids {
    tables: Vec<VectorTable>,
}

impl AminoAcids {
    pub fn new() -> Self {
        Self {
            tables: vec![tables::blosum62(), tables::one_hot()],
        }
    }

    /// Register an extra table; it must cover the whole alphabet width-wise.
    pub fn with_table(mut self, table: VectorTable) -> Self {
        self.tables.retain(|t| t.name() != table.name());
        self.tables.push(table);
        self
    }
}

impl Default for AminoAcids {
    fn default() -> Self {
        Self::new()
    }
}

impl AlphabetProvider for AminoAcids {
    fn alphabet(&self) -> &[u8] {
        amino::ALPHABET
    }

    fn index_encode(&self, sequences: &[String]) -> Result<Vec<Vec<usize>>> {
        sequences
            .iter()
            .map(|seq| {
                seq.bytes()
                    .map(|b| {
                        amino::to_alphabet(b)
                            .map(|a| a as usize)
                            .ok_or_else(|| PrepError::InvalidSymbol {
                                symbol: b as char,
                                sequence: seq.clone(),
                            })
                    })
                    .collect()
            })
            .collect()
    }

    fn scheme_table(&self, name: &str) -> Result<&VectorTable> {
        self.tables
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| PrepError::UnknownScheme {
                name: name.to_string(),
                legal: self.scheme_names(),
            })
    }

    fn scheme_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn index_encode_amino_acids() {
        let p = AminoAcids::new();
        let idx = p
            .index_encode(&["ACX".to_string(), "yw".to_string()])
            .unwrap();
        assert_eq!(idx, vec![vec![0, 1, 20], vec![19, 18]]);
    }

    #[test]
    fn index_encode_rejects_unknown_symbols() {
        let p = AminoAcids::new();
        let err = p.index_encode(&["AB".to_string()]).unwrap_err();
        assert!(matches!(err, PrepError::InvalidSymbol { symbol: 'B', .. }));
    }

    #[test]
    fn unknown_scheme_lists_names() {
        let p = AminoAcids::new();
        let err = p.scheme_table("PAM30").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        match err {
            PrepError::UnknownScheme { name, legal } => {
                assert_eq!(name, "PAM30");
                assert_eq!(legal, vec![BLOSUM62.to_string(), ONE_HOT.to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn custom_table_replaces_same_name() {
        let table = VectorTable::from_rows("tiny", 1, vec![[1.0f32]; 3]).unwrap();
        let p = AminoAcids::new().with_table(table);
        assert_eq!(p.scheme_names().len(), 3);
        assert_eq!(p.scheme_table("tiny").unwrap().symbols(), 3);
        assert!(p.scheme_table("tiny").unwrap().row(5).is_none());
    }

    #[test]
    fn default_index_encode_uses_alphabet() {
        #[derive(Debug)]
        struct Binary(VectorTable);
        impl AlphabetProvider for Binary {
            fn alphabet(&self) -> &[u8] {
                b"01X"
            }
            fn scheme_table(&self, _name: &str) -> Result<&VectorTable> {
                Ok(&self.0)
            }
            fn scheme_names(&self) -> Vec<String> {
                vec![self.0.name().to_string()]
            }
        }
        let p = Binary(VectorTable::from_flat("bits", 1, vec![0.0, 1.0, 0.5]).unwrap());
        assert_eq!(p.index_encode(&["10X".to_string()]).unwrap(), vec![vec![1, 0, 2]]);
        assert!(p.index_encode(&["2".to_string()]).is_err());
    }

    #[test]
    fn ragged_flat_table_is_rejected() {
        assert!(matches!(
            VectorTable::from_flat("odd", 2, vec![0.0, 1.0, 2.0]),
            Err(PrepError::Shape { .. })
        ));
        assert!(matches!(
            VectorTable::from_flat("empty", 0, Vec::new()),
            Err(PrepError::Shape { .. })
        ));
        let t = VectorTable::from_flat("pairs", 2, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(t.row(1), Some(&[2.0f32, 3.0][..]));
    }
}
