use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::alphabet::{AlphabetProvider, AminoAcids};
use crate::error::{PrepError, Result};
use crate::tensor::Tensor;
use crate::util::amino;

use super::cache::{EncodingCache, Operation};
use super::raw::RawTable;
use super::scheme::{Scheme, SchemeResolver};

#[derive(Debug)]
enum Source {
    /// 原始（未填充）序列，按名称排序。
    Sequences(BTreeMap<String, String>),
    Raw(RawTable),
}

/// 等位基因全集：稳定的名称 ↔ 索引映射，以及填充后的序列表。
///
/// - 索引 0 固定为哨兵（"无等位基因"），其余名称按字节序排列，占据 1..U。
/// - 所有序列以 `X` 右填充到同一长度 `L`，哨兵序列为全填充。
/// - 构建后不可变；全集级别的编码矩阵缓存在这里，借用同一全集的所有
///   [`AlleleEncoding`](super::AlleleEncoding) 共享同一份结果。
#[derive(Debug)]
pub struct AlleleUniverse {
    names: Vec<String>,
    index: HashMap<String, usize>,
    /// Padded sequences, sentinel first. Empty for raw universes.
    padded: Vec<String>,
    length: usize,
    source: Source,
    provider: Arc<dyn AlphabetProvider>,
    resolver: Option<Arc<dyn SchemeResolver>>,
    cache: EncodingCache,
}

impl AlleleUniverse {
    /// Build from an allele → sequence mapping.
    pub fn from_sequences(sequences: BTreeMap<String, String>) -> Result<Self> {
        Self::padded_to(sequences, 0)
    }

    /// Like [`from_sequences`](Self::from_sequences), but pad to at least
    /// `min_length` even if every sequence is shorter.
    pub fn padded_to(sequences: BTreeMap<String, String>, min_length: usize) -> Result<Self> {
        if sequences.is_empty() {
            return Err(PrepError::config("allele universe is empty"));
        }
        let provider: Arc<dyn AlphabetProvider> = Arc::new(AminoAcids::new());
        let length = sequences
            .values()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(min_length);
        let padded = pad_all(&sequences, length, provider.pad_symbol());
        let names: Vec<String> = sequences.keys().cloned().collect();
        debug!(alleles = names.len(), length, "built allele universe");
        Ok(Self {
            index: index_names(&names),
            names,
            padded,
            length,
            source: Source::Sequences(sequences),
            provider,
            resolver: None,
            cache: EncodingCache::new(),
        })
    }

    /// Build from `(allele, sequence)` pairs, e.g. rows of a table or FASTA
    /// records. Repeated names are rejected instead of overwritten.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, seq) in pairs {
            let name = name.into();
            if map.contains_key(&name) {
                return Err(PrepError::config(format!("duplicate allele '{}'", name)));
            }
            map.insert(name, seq.into());
        }
        Self::from_sequences(map)
    }

    /// Build from per-allele representations supplied as-is.
    pub fn from_raw(table: RawTable) -> Result<Self> {
        if table.is_empty() {
            return Err(PrepError::config("allele universe is empty"));
        }
        let names: Vec<String> = table.names().map(str::to_string).collect();
        Ok(Self {
            index: index_names(&names),
            names,
            padded: Vec::new(),
            length: table.length(),
            source: Source::Raw(table),
            provider: Arc::new(AminoAcids::new()),
            resolver: None,
            cache: EncodingCache::new(),
        })
    }

    /// Replace the alphabet provider used for [`Scheme::Table`].
    pub fn with_provider(mut self, provider: Arc<dyn AlphabetProvider>) -> Self {
        if let Source::Sequences(map) = &self.source {
            self.padded = pad_all(map, self.length, provider.pad_symbol());
        }
        self.provider = provider;
        self.cache = EncodingCache::new();
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SchemeResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Number of entries `U`, sentinel included.
    pub fn len(&self) -> usize {
        self.names.len() + 1
    }

    /// A universe always holds the sentinel, so this is never true.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Allele names in index order (index `i + 1`), sentinel excluded.
    pub fn alleles(&self) -> &[String] {
        &self.names
    }

    /// `None` ("no allele") resolves to the sentinel at 0.
    pub fn index_of(&self, allele: Option<&str>) -> Option<usize> {
        match allele {
            None => Some(0),
            Some(name) => self.index.get(name).copied(),
        }
    }

    pub fn contains(&self, allele: &str) -> bool {
        self.index.contains_key(allele)
    }

    /// Name at `index`; `None` for the sentinel or out of range.
    pub fn name(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    /// Padded length `L`.
    #[inline]
    pub fn padded_length(&self) -> usize {
        self.length
    }

    /// Padded sequence at `index` (sentinel included); `None` for raw universes.
    pub fn padded_sequence(&self, index: usize) -> Option<&str> {
        self.padded.get(index).map(String::as_str)
    }

    /// Original, unpadded sequence of `allele`.
    pub fn sequence(&self, allele: &str) -> Option<&str> {
        match &self.source {
            Source::Sequences(map) => map.get(allele).map(String::as_str),
            Source::Raw(_) => None,
        }
    }

    pub fn raw_table(&self) -> Option<&RawTable> {
        match &self.source {
            Source::Raw(table) => Some(table),
            Source::Sequences(_) => None,
        }
    }

    pub fn provider(&self) -> &Arc<dyn AlphabetProvider> {
        &self.provider
    }

    pub fn resolver(&self) -> Option<&Arc<dyn SchemeResolver>> {
        self.resolver.as_ref()
    }

    pub(crate) fn cache(&self) -> &EncodingCache {
        &self.cache
    }

    /// A raw universe answers table requests with its own table.
    fn normalize(&self, scheme: &Scheme) -> Scheme {
        match (&self.source, scheme) {
            (Source::Raw(_), Scheme::Table(_)) => Scheme::Raw,
            _ => scheme.clone(),
        }
    }

    /// `(U, L, V)` matrix for `scheme`, computed once and shared.
    pub fn representations(&self, scheme: &Scheme) -> Result<Arc<Tensor>> {
        let scheme = self.normalize(scheme);
        self.cache
            .get_or_try_insert_with(Operation::Universe, &scheme, || match &scheme {
                Scheme::Table(name) => self.encode_table(name),
                Scheme::Raw => self.encode_raw(),
                Scheme::External(name) => self.encode_external(name),
            })
    }

    fn encode_table(&self, name: &str) -> Result<Tensor> {
        let table = self.provider.scheme_table(name)?;
        let width = table.width();
        let alphabet = self.provider.alphabet();
        let pad = self.provider.pad_symbol();

        let missing = |symbol: usize| PrepError::MissingSymbol {
            symbol: alphabet.get(symbol).map_or('?', |&b| b as char),
            scheme: name.to_string(),
        };
        let pad_index = alphabet
            .iter()
            .position(|&s| s == pad)
            .ok_or_else(|| PrepError::MissingSymbol {
                symbol: pad as char,
                scheme: name.to_string(),
            })?;
        if table.row(pad_index).is_none() {
            return Err(missing(pad_index));
        }

        let encoded = self.provider.index_encode(&self.padded)?;
        let mut out = Tensor::zeros(self.len(), self.length, width);
        let row_len = self.length * width;
        if row_len == 0 {
            return Ok(out);
        }
        let rows: Vec<Result<Vec<f32>>> = encoded
            .par_iter()
            .map(|symbols| {
                let mut row = Vec::with_capacity(row_len);
                for &s in symbols {
                    row.extend_from_slice(table.row(s).ok_or_else(|| missing(s))?);
                }
                Ok(row)
            })
            .collect();
        for (i, row) in rows.into_iter().enumerate() {
            out.row_mut(i).copy_from_slice(&row?);
        }
        Ok(out)
    }

    fn encode_raw(&self) -> Result<Tensor> {
        let table = self
            .raw_table()
            .ok_or_else(|| {
                PrepError::config("universe was built from sequences, not a raw table")
            })?;
        let rows = self.names.iter().map(|name| table.get(name).unwrap_or(&[]));
        Ok(Tensor::from_rows(table.length(), table.width(), rows)?.prepend_zero_row())
    }

    fn encode_external(&self, name: &str) -> Result<Tensor> {
        let resolver = self.resolver.as_ref().ok_or_else(|| PrepError::UnknownScheme {
            name: name.to_string(),
            legal: Vec::new(),
        })?;
        let legal = resolver.names()?;
        if !legal.iter().any(|n| n == name) {
            return Err(PrepError::UnknownScheme {
                name: name.to_string(),
                legal,
            });
        }
        let features = resolver.resolve(name, &self.names)?;
        if features.rows() != self.names.len() {
            return Err(PrepError::shape(
                format!("{} allele rows from resolver '{}'", self.names.len(), name),
                format!("{} rows", features.rows()),
            ));
        }
        Ok(features.prepend_zero_row())
    }
}

/// Sentinel (empty) first, then every sequence, right-padded to `length`.
fn pad_all(sequences: &BTreeMap<String, String>, length: usize, pad: u8) -> Vec<String> {
    std::iter::once("")
        .chain(sequences.values().map(String::as_str))
        .map(|s| amino::pad_right(s, length, pad))
        .collect()
}

fn index_names(names: &[String]) -> HashMap<String, usize> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i + 1))
        .collect()
}
