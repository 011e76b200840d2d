use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use crate::alphabet::AlphabetProvider;
use crate::error::{PrepError, Result};
use crate::tensor::Tensor;

use super::cache::{EncodingCache, Operation};
use super::raw::RawTable;
use super::scheme::{Scheme, SchemeResolver};
use super::universe::AlleleUniverse;

/// 一组等位基因（工作列表）在某个全集上的编码视图。
///
/// The universe is shared through an `Arc`: an encoding built with
/// [`borrowing`](Self::borrowing) resolves names to the same indices as its
/// lender and receives the very same universe matrix for every scheme. The
/// per-request matrices depend on the working list and are cached on each
/// handle separately.
#[derive(Debug)]
pub struct AlleleEncoding {
    universe: Arc<AlleleUniverse>,
    alleles: Option<Vec<Option<String>>>,
    indices: Option<Vec<usize>>,
    borrowed: bool,
    cache: EncodingCache,
}

impl AlleleEncoding {
    pub fn builder<'a>() -> AlleleEncodingBuilder<'a> {
        AlleleEncodingBuilder::default()
    }

    /// Owning encoding of `alleles` over the universe defined by `sequences`.
    pub fn new<I, S>(alleles: I, sequences: BTreeMap<String, String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::builder().alleles(alleles).sequences(sequences).build()
    }

    /// Encoding of `alleles` that shares `lender`'s universe.
    pub fn borrowing<I, S>(alleles: I, lender: &AlleleEncoding) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::builder().alleles(alleles).borrow_from(lender).build()
    }

    /// Owning encoding over per-allele representations supplied as-is.
    pub fn from_raw<I, S>(alleles: I, table: RawTable) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::builder().alleles(alleles).raw(table).build()
    }

    fn with_universe(
        universe: Arc<AlleleUniverse>,
        alleles: Option<Vec<Option<String>>>,
        borrowed: bool,
    ) -> Result<Self> {
        let indices = match &alleles {
            Some(list) => Some(resolve(&universe, list)?),
            None => None,
        };
        Ok(Self {
            universe,
            alleles,
            indices,
            borrowed,
            cache: EncodingCache::new(),
        })
    }

    pub fn universe(&self) -> &Arc<AlleleUniverse> {
        &self.universe
    }

    /// Whether both handles resolve against the same universe instance.
    pub fn shares_universe_with(&self, other: &AlleleEncoding) -> bool {
        Arc::ptr_eq(&self.universe, &other.universe)
    }

    pub fn is_borrowed(&self) -> bool {
        self.borrowed
    }

    /// The working list; `None` entries stand for "no allele".
    pub fn alleles(&self) -> Option<&[Option<String>]> {
        self.alleles.as_deref()
    }

    /// Universe index of every working-list entry.
    pub fn indices(&self) -> Option<&[usize]> {
        self.indices.as_deref()
    }

    /// Number of working-list entries `N` (zero without a working list).
    pub fn len(&self) -> usize {
        self.indices.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// New owning encoding whose universe holds only the distinct alleles of
    /// the working list. The padded length of the parent is kept, so the
    /// per-request matrices of both encodings agree.
    pub fn compact(&self) -> Result<AlleleEncoding> {
        let alleles = self
            .alleles
            .as_ref()
            .ok_or_else(|| PrepError::config("cannot compact an encoding without alleles"))?;
        let used: BTreeSet<&str> = alleles.iter().flatten().map(String::as_str).collect();

        let parent = &self.universe;
        let universe = match parent.raw_table() {
            Some(table) => AlleleUniverse::from_raw(table.restrict(used.iter().copied())?)?,
            None => {
                let sequences = used
                    .iter()
                    .map(|&name| {
                        let seq = parent.sequence(name).ok_or_else(|| {
                            PrepError::MissingAlleles {
                                alleles: vec![name.to_string()],
                            }
                        })?;
                        Ok((name.to_string(), seq.to_string()))
                    })
                    .collect::<Result<BTreeMap<_, _>>>()?;
                AlleleUniverse::padded_to(sequences, parent.padded_length())?
                    .with_provider(Arc::clone(parent.provider()))
            }
        };
        let universe = match parent.resolver() {
            Some(resolver) => universe.with_resolver(Arc::clone(resolver)),
            None => universe,
        };
        debug!(
            before = parent.len(),
            after = universe.len(),
            "compacted allele universe"
        );
        Self::with_universe(Arc::new(universe), Some(alleles.clone()), false)
    }

    /// `(U, L, V)` matrix over the universe, shared with every encoding that
    /// uses the same universe.
    pub fn allele_representations(&self, scheme: &Scheme) -> Result<Arc<Tensor>> {
        self.universe.representations(scheme)
    }

    /// `(N, L, V)` matrix: row `i` is the universe row of working allele `i`.
    pub fn fixed_length_vector_encoded_sequences(&self, scheme: &Scheme) -> Result<Arc<Tensor>> {
        let indices = self
            .indices
            .as_ref()
            .ok_or_else(|| PrepError::config("encoding has no working list of alleles"))?;
        self.cache
            .get_or_try_insert_with(Operation::PerRequest, scheme, || {
                let universe = self.allele_representations(scheme)?;
                Ok(universe.gather(indices))
            })
    }
}

/// Resolve names to universe indices, listing every distinct missing name.
fn resolve(universe: &AlleleUniverse, alleles: &[Option<String>]) -> Result<Vec<usize>> {
    let mut indices = Vec::with_capacity(alleles.len());
    let mut missing = BTreeSet::new();
    for allele in alleles {
        match universe.index_of(allele.as_deref()) {
            Some(i) => indices.push(i),
            None => {
                if let Some(name) = allele {
                    missing.insert(name.clone());
                }
            }
        }
    }
    if !missing.is_empty() {
        return Err(PrepError::MissingAlleles {
            alleles: missing.into_iter().collect(),
        });
    }
    Ok(indices)
}

/// Builder for [`AlleleEncoding`].
///
/// Exactly one universe source must be given: `sequences`, `raw`,
/// `universe`, or `borrow_from`.
#[derive(Default)]
pub struct AlleleEncodingBuilder<'a> {
    alleles: Option<Vec<Option<String>>>,
    sequences: Option<BTreeMap<String, String>>,
    raw: Option<RawTable>,
    universe: Option<Arc<AlleleUniverse>>,
    borrow_from: Option<&'a AlleleEncoding>,
    provider: Option<Arc<dyn AlphabetProvider>>,
    resolver: Option<Arc<dyn SchemeResolver>>,
}

impl<'a> AlleleEncodingBuilder<'a> {
    pub fn alleles<I, S>(mut self, alleles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.alleles = Some(
            alleles
                .into_iter()
                .map(|a| Some(a.as_ref().to_string()))
                .collect(),
        );
        self
    }

    /// Working list where `None` means "no allele" (sentinel index 0).
    pub fn optional_alleles<I, S>(mut self, alleles: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        self.alleles = Some(
            alleles
                .into_iter()
                .map(|a| a.map(|s| s.as_ref().to_string()))
                .collect(),
        );
        self
    }

    pub fn sequences(mut self, sequences: BTreeMap<String, String>) -> Self {
        self.sequences = Some(sequences);
        self
    }

    pub fn raw(mut self, table: RawTable) -> Self {
        self.raw = Some(table);
        self
    }

    /// Use an already built universe, e.g. one shared across threads.
    pub fn universe(mut self, universe: Arc<AlleleUniverse>) -> Self {
        self.universe = Some(universe);
        self
    }

    pub fn borrow_from(mut self, lender: &'a AlleleEncoding) -> Self {
        self.borrow_from = Some(lender);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn AlphabetProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn SchemeResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> Result<AlleleEncoding> {
        let sources = [
            self.sequences.is_some(),
            self.raw.is_some(),
            self.universe.is_some(),
            self.borrow_from.is_some(),
        ]
        .iter()
        .filter(|&&given| given)
        .count();
        if sources != 1 {
            return Err(PrepError::config(format!(
                "exactly one of sequences, raw table, universe or borrow_from must be given ({} given)",
                sources
            )));
        }
        let customised = self.provider.is_some() || self.resolver.is_some();

        if let Some(lender) = self.borrow_from {
            if customised {
                return Err(PrepError::config(
                    "a borrowed universe keeps its lender's provider and resolver",
                ));
            }
            return AlleleEncoding::with_universe(Arc::clone(&lender.universe), self.alleles, true);
        }
        if let Some(universe) = self.universe {
            if customised {
                return Err(PrepError::config(
                    "provider and resolver must be set on the shared universe itself",
                ));
            }
            return AlleleEncoding::with_universe(universe, self.alleles, true);
        }

        let mut universe = match (self.sequences, self.raw) {
            (Some(sequences), _) => AlleleUniverse::from_sequences(sequences)?,
            (None, Some(table)) => AlleleUniverse::from_raw(table)?,
            (None, None) => return Err(PrepError::config("no allele universe given")),
        };
        if let Some(provider) = self.provider {
            universe = universe.with_provider(provider);
        }
        if let Some(resolver) = self.resolver {
            universe = universe.with_resolver(resolver);
        }
        AlleleEncoding::with_universe(Arc::new(universe), self.alleles, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{AminoAcids, BLOSUM62, ONE_HOT};
    use crate::error::ErrorKind;

    fn sequences(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|&(a, s)| (a.to_string(), s.to_string()))
            .collect()
    }

    fn blosum_row(symbol: u8) -> Vec<f32> {
        let provider = AminoAcids::new();
        let table = provider.scheme_table(BLOSUM62).unwrap();
        let idx = crate::util::amino::to_alphabet(symbol).unwrap() as usize;
        table.row(idx).unwrap().to_vec()
    }

    #[test]
    fn encodes_working_list_with_repeats() {
        let enc = AlleleEncoding::new(
            ["A*02:01", "A*02:03", "A*02:01"],
            sequences(&[("A*02:01", "AC"), ("A*02:03", "AE")]),
        )
        .unwrap();
        let m = enc
            .fixed_length_vector_encoded_sequences(&Scheme::table(BLOSUM62))
            .unwrap();
        assert_eq!(m.shape(), (3, 2, 21));
        assert_eq!(m.row(0), m.row(2));
        assert_eq!(m.position(0, 0), blosum_row(b'A').as_slice());
        assert_eq!(m.position(0, 1), blosum_row(b'C').as_slice());
        assert_eq!(m.position(1, 0), blosum_row(b'A').as_slice());
        assert_eq!(m.position(1, 1), blosum_row(b'E').as_slice());
    }

    #[test]
    fn rows_match_universe_rows() {
        let enc = AlleleEncoding::builder()
            .optional_alleles([Some("B*07:02"), None, Some("A*02:01"), Some("B*07:02")])
            .sequences(sequences(&[
                ("A*02:01", "AC"),
                ("A*02:03", "AE"),
                ("B*07:02", "YWVK"),
            ]))
            .build()
            .unwrap();
        assert_eq!(enc.indices(), Some(&[3, 0, 1, 3][..]));
        for scheme in [Scheme::table(BLOSUM62), Scheme::table(ONE_HOT)] {
            let universe = enc.allele_representations(&scheme).unwrap();
            let per_request = enc.fixed_length_vector_encoded_sequences(&scheme).unwrap();
            assert_eq!(per_request.shape(), (4, 4, 21));
            for (i, &idx) in enc.indices().unwrap().iter().enumerate() {
                assert_eq!(per_request.row(i), universe.row(idx));
            }
        }
    }

    #[test]
    fn per_request_matrix_is_memoized() {
        let enc = AlleleEncoding::new(["A*02:01"], sequences(&[("A*02:01", "AC")])).unwrap();
        let scheme = Scheme::table(ONE_HOT);
        let a = enc.fixed_length_vector_encoded_sequences(&scheme).unwrap();
        let b = enc.fixed_length_vector_encoded_sequences(&scheme).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(enc.universe().cache().len(), 1);
    }

    #[test]
    fn missing_alleles_are_listed() {
        let err = AlleleEncoding::new(
            ["A*02:01", "B*07:02", "C*01:02", "B*07:02"],
            sequences(&[("A*02:01", "AC")]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        match err {
            PrepError::MissingAlleles { alleles } => {
                assert_eq!(alleles, vec!["B*07:02", "C*01:02"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn universe_sources_are_mutually_exclusive() {
        let lender = AlleleEncoding::new(["A*02:01"], sequences(&[("A*02:01", "AC")])).unwrap();

        let both = AlleleEncoding::builder()
            .alleles(["A*02:01"])
            .sequences(sequences(&[("A*02:01", "AC")]))
            .borrow_from(&lender)
            .build();
        assert_eq!(both.unwrap_err().kind(), ErrorKind::Configuration);

        let neither = AlleleEncoding::builder().alleles(["A*02:01"]).build();
        assert_eq!(neither.unwrap_err().kind(), ErrorKind::Configuration);

        let custom_borrow = AlleleEncoding::builder()
            .borrow_from(&lender)
            .provider(Arc::new(AminoAcids::new()))
            .build();
        assert_eq!(custom_borrow.unwrap_err().kind(), ErrorKind::Configuration);
    }

    #[test]
    fn borrowing_shares_universe_and_matrices() {
        let universe = sequences(&[("A*02:01", "AC"), ("A*02:03", "AE"), ("B*07:02", "ACDE")]);
        let lender = AlleleEncoding::builder().sequences(universe).build().unwrap();
        assert!(lender.indices().is_none());
        assert!(lender.is_empty());

        let train = AlleleEncoding::borrowing(["A*02:01", "B*07:02"], &lender).unwrap();
        let test = AlleleEncoding::borrowing(["A*02:03"], &lender).unwrap();
        assert!(train.is_borrowed());
        assert!(train.shares_universe_with(&test));
        assert!(train.shares_universe_with(&lender));

        let scheme = Scheme::table(BLOSUM62);
        let a = train.allele_representations(&scheme).unwrap();
        let b = test.allele_representations(&scheme).unwrap();
        let c = lender.allele_representations(&scheme).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));

        assert_eq!(
            train.universe().index_of(Some("A*02:03")),
            lender.universe().index_of(Some("A*02:03"))
        );
        assert_eq!(test.indices(), Some(&[2][..]));

        let tr = train.fixed_length_vector_encoded_sequences(&scheme).unwrap();
        let te = test.fixed_length_vector_encoded_sequences(&scheme).unwrap();
        assert_eq!(tr.rows(), 2);
        assert_eq!(te.rows(), 1);
        assert!(!Arc::ptr_eq(&tr, &te));
    }

    #[test]
    fn borrowing_rejects_unknown_alleles() {
        let lender = AlleleEncoding::builder()
            .sequences(sequences(&[("A*02:01", "AC")]))
            .build()
            .unwrap();
        assert!(matches!(
            AlleleEncoding::borrowing(["A*02:01", "B*07:02"], &lender),
            Err(PrepError::MissingAlleles { .. })
        ));
    }

    #[test]
    fn per_request_needs_working_list() {
        let carrier = AlleleEncoding::builder()
            .sequences(sequences(&[("A*02:01", "AC")]))
            .build()
            .unwrap();
        assert!(carrier
            .allele_representations(&Scheme::table(BLOSUM62))
            .is_ok());
        assert_eq!(
            carrier
                .fixed_length_vector_encoded_sequences(&Scheme::table(BLOSUM62))
                .unwrap_err()
                .kind(),
            ErrorKind::Configuration
        );
        assert!(carrier.compact().is_err());
    }

    #[test]
    fn compact_keeps_encodings() {
        let enc = AlleleEncoding::builder()
            .optional_alleles([Some("B*07:02"), Some("A*02:01"), None, Some("B*07:02")])
            .sequences(sequences(&[
                ("A*02:01", "AC"),
                ("A*02:03", "AE"),
                ("A*03:01", "ACDEFGHIK"),
                ("B*07:02", "YWV"),
            ]))
            .build()
            .unwrap();
        let compact = enc.compact().unwrap();
        assert!(!compact.is_borrowed());
        assert!(!compact.shares_universe_with(&enc));
        assert_eq!(compact.universe().alleles(), &["A*02:01", "B*07:02"]);
        assert_eq!(compact.universe().len(), 3);
        assert_eq!(compact.indices(), Some(&[2, 1, 0, 2][..]));
        assert_eq!(compact.universe().sequence("A*02:01"), Some("AC"));
        assert_eq!(compact.universe().sequence("B*07:02"), Some("YWV"));
        assert_eq!(compact.universe().sequence("A*03:01"), None);
        assert_eq!(compact.universe().padded_length(), enc.universe().padded_length());

        for scheme in [Scheme::table(BLOSUM62), Scheme::table(ONE_HOT)] {
            let before = enc.fixed_length_vector_encoded_sequences(&scheme).unwrap();
            let after = compact.fixed_length_vector_encoded_sequences(&scheme).unwrap();
            assert_eq!(*before, *after);
        }
    }

    #[test]
    fn compact_raw_table() {
        let table = RawTable::from_vectors(
            2,
            vec![
                ("A*02:01", vec![1.0, 2.0]),
                ("A*02:03", vec![3.0, 4.0]),
                ("B*07:02", vec![5.0, 6.0]),
            ],
        )
        .unwrap();
        let enc = AlleleEncoding::from_raw(["B*07:02", "A*02:01"], table).unwrap();
        let compact = enc.compact().unwrap();
        assert_eq!(compact.universe().len(), 3);
        let before = enc.fixed_length_vector_encoded_sequences(&Scheme::Raw).unwrap();
        let after = compact
            .fixed_length_vector_encoded_sequences(&Scheme::Raw)
            .unwrap();
        assert_eq!(*before, *after);
        assert_eq!(after.row(0), &[5.0, 6.0]);
    }

    #[test]
    fn raw_values_pass_through_for_table_names() {
        let table = RawTable::from_vectors(
            3,
            vec![
                ("A*02:01", vec![0.0, 1.0, -1.0]),
                ("A*02:03", vec![10.0, 11.0, 12.0]),
            ],
        )
        .unwrap();
        let enc = AlleleEncoding::from_raw(["A*02:01", "A*02:03", "A*02:01"], table).unwrap();
        let m = enc
            .fixed_length_vector_encoded_sequences(&Scheme::table(BLOSUM62))
            .unwrap();
        let rows: Vec<Vec<f32>> = m.iter_rows().map(<[f32]>::to_vec).collect();
        assert_eq!(
            rows,
            vec![
                vec![0.0, 1.0, -1.0],
                vec![10.0, 11.0, 12.0],
                vec![0.0, 1.0, -1.0],
            ]
        );
    }

    #[test]
    fn shared_universe_across_threads() {
        let lender = AlleleEncoding::builder()
            .sequences(sequences(&[("A*02:01", "AC"), ("A*02:03", "AE")]))
            .build()
            .unwrap();
        let universe = Arc::clone(lender.universe());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let universe = Arc::clone(&universe);
                std::thread::spawn(move || {
                    let enc = AlleleEncoding::builder()
                        .alleles(["A*02:03", "A*02:01"])
                        .universe(universe)
                        .build()
                        .unwrap();
                    enc.allele_representations(&Scheme::table(BLOSUM62)).unwrap()
                })
            })
            .collect();
        let matrices: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(matrices.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
