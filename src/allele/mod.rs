//! 等位基因编码缓存：全集索引、编码方案与按需计算的向量编码。

pub mod cache;
pub mod encoding;
pub mod raw;
pub mod scheme;
pub mod universe;

pub use cache::{EncodingCache, Operation};
pub use encoding::{AlleleEncoding, AlleleEncodingBuilder};
pub use raw::RawTable;
pub use scheme::{Scheme, SchemeResolver};
pub use universe::AlleleUniverse;
