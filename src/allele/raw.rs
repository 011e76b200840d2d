use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Per-allele numeric representations supplied directly instead of being
/// computed from sequences. Each allele carries `length * width` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    length: usize,
    width: usize,
    rows: BTreeMap<String, Vec<f32>>,
}

impl RawTable {
    pub fn new(length: usize, width: usize) -> Self {
        Self {
            length,
            width,
            rows: BTreeMap::new(),
        }
    }

    /// A table of plain feature vectors (`length == 1`).
    pub fn from_vectors<I, S>(width: usize, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut table = Self::new(1, width);
        for (name, values) in rows {
            table.insert(name, values)?;
        }
        Ok(table)
    }

    pub fn insert(&mut self, allele: impl Into<String>, values: Vec<f32>) -> Result<()> {
        let allele = allele.into();
        if values.len() != self.length * self.width {
            return Err(PrepError::shape(
                format!("{} values per allele", self.length * self.width),
                format!("{} values for '{}'", values.len(), allele),
            ));
        }
        if self.rows.contains_key(&allele) {
            return Err(PrepError::config(format!("duplicate allele '{}'", allele)));
        }
        self.rows.insert(allele, values);
        Ok(())
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, allele: &str) -> Option<&[f32]> {
        self.rows.get(allele).map(Vec::as_slice)
    }

    /// Allele names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.keys().map(String::as_str)
    }

    /// Keep only `alleles`; every one of them must be present.
    pub fn restrict<'a, I>(&self, alleles: I) -> Result<RawTable>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = Self::new(self.length, self.width);
        let mut missing = Vec::new();
        for name in alleles {
            match self.rows.get(name) {
                Some(values) => {
                    out.rows.insert(name.to_string(), values.clone());
                }
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            missing.sort();
            missing.dedup();
            return Err(PrepError::MissingAlleles { alleles: missing });
        }
        Ok(out)
    }
}
