use std::convert::Infallible;
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tensor::Tensor;

/// How allele sequences are turned into vectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    /// Per-residue rows looked up in a named table of the alphabet provider.
    Table(String),
    /// The per-allele table supplied when the universe was built.
    Raw,
    /// Per-allele features produced by the universe's [`SchemeResolver`].
    External(String),
}

impl Scheme {
    pub fn table(name: impl Into<String>) -> Self {
        Self::Table(name.into())
    }

    pub fn external(name: impl Into<String>) -> Self {
        Self::External(name.into())
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Table(name) => write!(f, "{}", name),
            Scheme::Raw => write!(f, "raw"),
            Scheme::External(name) => write!(f, "external:{}", name),
        }
    }
}

/// `raw` and `external:<name>` are recognised, anything else names a table.
impl FromStr for Scheme {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(if s == "raw" {
            Scheme::Raw
        } else if let Some(name) = s.strip_prefix("external:") {
            Scheme::External(name.to_string())
        } else {
            Scheme::Table(s.to_string())
        })
    }
}

impl From<&str> for Scheme {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(scheme) => scheme,
            Err(never) => match never {},
        }
    }
}

/// Produces per-allele feature matrices for [`Scheme::External`] names.
///
/// `resolve` receives the universe's allele names in index order, without the
/// sentinel, and must return one record per name.
pub trait SchemeResolver: Debug + Send + Sync {
    /// Scheme names this resolver can produce.
    fn names(&self) -> Result<Vec<String>>;

    fn resolve(&self, name: &str, alleles: &[String]) -> Result<Tensor>;
}
