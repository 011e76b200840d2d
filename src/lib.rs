//! # mhc-prep
//!
//! MHC 结合亲和力训练数据的预处理工具库。
//!
//! 本 crate 提供两块核心功能：
//!
//! - **等位基因编码缓存**：稳定的等位基因名 ↔ 索引映射（索引 0 为哨兵），
//!   区分"全集"与数据集实际用到的工作列表，并按编码方案惰性计算、缓存
//!   定长向量编码（BLOSUM62、one-hot、原始数值表、外部特征表）
//! - **百分位秩变换**：用直方图拟合经验 CDF，把任意分数单调映射到 [0, 100]
//!
//! ## 快速示例
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use mhc_prep::allele::{AlleleEncoding, Scheme};
//! use mhc_prep::rank::PercentRankTransform;
//!
//! let mut sequences = BTreeMap::new();
//! sequences.insert("HLA-A*02:01".to_string(), "YFAMYGEKVAHTH".to_string());
//! sequences.insert("HLA-B*07:02".to_string(), "YYSEYRNIYAQTD".to_string());
//!
//! let universe = AlleleEncoding::builder().sequences(sequences).build()?;
//! let train = AlleleEncoding::borrowing(["HLA-A*02:01", "HLA-A*02:01"], &universe)?;
//! let encoded = train.fixed_length_vector_encoded_sequences(&Scheme::table("BLOSUM62"))?;
//! assert_eq!(encoded.shape(), (2, 13, 21));
//!
//! let mut ranks = PercentRankTransform::new();
//! ranks.fit(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0], 4)?;
//! assert_eq!(ranks.transform(&[0.0, 100.0])?, vec![0.0, 100.0]);
//! # Ok::<(), mhc_prep::PrepError>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`allele`] — 等位基因全集、编码句柄、编码方案与缓存
//! - [`alphabet`] — 氨基酸字母表与 BLOSUM62 / one-hot 编码表
//! - [`rank`] — 直方图、百分位秩变换及其序列化
//! - [`io`] — FASTA / CSV / TSV 读写、外部特征表、编码归档
//! - [`pipeline`] — 命令行子命令的执行逻辑
//! - [`tensor`] — `(rows, length, width)` 稠密存储
//! - [`util`] — 氨基酸编码 / 填充工具函数

pub mod allele;
pub mod alphabet;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod rank;
pub mod tensor;
pub mod util;

pub use error::{PrepError, Result};
