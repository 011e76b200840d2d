use std::path::{Path, PathBuf};

use tracing::debug;

use crate::allele::SchemeResolver;
use crate::error::{PrepError, Result};
use crate::tensor::Tensor;

use super::table::read_raw_table;

/// Resolves [`Scheme::External`](crate::allele::Scheme::External) names to
/// per-allele feature tables stored as `<dir>/<name>.csv` (or `.tsv`).
#[derive(Debug, Clone)]
pub struct FeatureTableResolver {
    dir: PathBuf,
    allele_col: String,
}

impl FeatureTableResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            allele_col: "allele".to_string(),
        }
    }

    pub fn with_allele_column(mut self, name: impl Into<String>) -> Self {
        self.allele_col = name.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        ["csv", "tsv"]
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", name, ext)))
            .find(|p| p.is_file())
    }
}

impl SchemeResolver for FeatureTableResolver {
    fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !matches!(path.extension().and_then(|e| e.to_str()), Some("csv" | "tsv")) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn resolve(&self, name: &str, alleles: &[String]) -> Result<Tensor> {
        let path = match self.path_for(name) {
            Some(path) => path,
            None => {
                return Err(PrepError::UnknownScheme {
                    name: name.to_string(),
                    legal: self.names()?,
                })
            }
        };
        debug!(path = %path.display(), alleles = alleles.len(), "loading feature table");
        let table = read_raw_table(&path, &self.allele_col)?;
        let table = table.restrict(alleles.iter().map(String::as_str))?;
        let rows = alleles.iter().map(|a| table.get(a).unwrap_or(&[]));
        Tensor::from_rows(table.length(), table.width(), rows)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::allele::{AlleleEncoding, Scheme};

    fn feature_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pseudo.csv"),
            "allele,f0,f1\nA*02:01,0.5,1.5\nA*02:03,2.5,3.5\nB*07:02,9,9\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        dir
    }

    #[test]
    fn lists_tables() {
        let dir = feature_dir();
        let r = FeatureTableResolver::new(dir.path());
        assert_eq!(r.names().unwrap(), vec!["pseudo"]);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let r = FeatureTableResolver::new(dir.path().join("absent"));
        assert!(matches!(r.names(), Err(PrepError::Io(_))));
        assert!(matches!(
            r.resolve("pseudo", &["A*02:01".to_string()]),
            Err(PrepError::Io(_))
        ));

        let sequences: BTreeMap<String, String> =
            [("A*02:01".to_string(), "AC".to_string())].into_iter().collect();
        let enc = AlleleEncoding::builder()
            .alleles(["A*02:01"])
            .sequences(sequences)
            .resolver(Arc::new(r))
            .build()
            .unwrap();
        assert!(matches!(
            enc.allele_representations(&Scheme::external("pseudo")),
            Err(PrepError::Io(_))
        ));
    }

    #[test]
    fn resolves_in_allele_order() {
        let dir = feature_dir();
        let r = FeatureTableResolver::new(dir.path());
        let t = r
            .resolve("pseudo", &["A*02:03".to_string(), "A*02:01".to_string()])
            .unwrap();
        assert_eq!(t.shape(), (2, 1, 2));
        assert_eq!(t.row(0), &[2.5, 3.5]);
        assert_eq!(t.row(1), &[0.5, 1.5]);

        assert!(matches!(
            r.resolve("pseudo", &["C*01:02".to_string()]),
            Err(PrepError::MissingAlleles { .. })
        ));
        assert!(matches!(
            r.resolve("esm", &[]),
            Err(PrepError::UnknownScheme { .. })
        ));
    }

    #[test]
    fn external_scheme_through_encoding() {
        let dir = feature_dir();
        let sequences: BTreeMap<String, String> = [("A*02:01", "AC"), ("A*02:03", "AE")]
            .iter()
            .map(|&(a, s)| (a.to_string(), s.to_string()))
            .collect();
        let enc = AlleleEncoding::builder()
            .optional_alleles([Some("A*02:03"), None])
            .sequences(sequences)
            .resolver(Arc::new(FeatureTableResolver::new(dir.path())))
            .build()
            .unwrap();
        let u = enc
            .allele_representations(&Scheme::external("pseudo"))
            .unwrap();
        assert_eq!(u.shape(), (3, 1, 2));
        assert_eq!(u.row(0), &[0.0, 0.0]);
        assert_eq!(u.row(1), &[0.5, 1.5]);
        let m = enc
            .fixed_length_vector_encoded_sequences(&Scheme::external("pseudo"))
            .unwrap();
        assert_eq!(m.row(0), &[2.5, 3.5]);
        assert_eq!(m.row(1), &[0.0, 0.0]);
    }
}
