//! Dense row-major storage for `(rows, length, width)` encodings.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// 三维稠密张量：`rows` 条记录，每条 `length` 个位置，每个位置 `width` 维向量。
///
/// Data is stored flattened as `data[(i * length + j) * width + k]`, so one
/// record is a contiguous `length * width` slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    rows: usize,
    length: usize,
    width: usize,
    data: Vec<f32>,
}

impl Tensor {
    pub fn zeros(rows: usize, length: usize, width: usize) -> Self {
        Self {
            rows,
            length,
            width,
            data: vec![0.0; rows * length * width],
        }
    }

    /// Wrap an already flattened buffer.
    pub fn from_vec(rows: usize, length: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * length * width {
            return Err(PrepError::shape(
                format!("{} values for ({}, {}, {})", rows * length * width, rows, length, width),
                format!("{} values", data.len()),
            ));
        }
        Ok(Self {
            rows,
            length,
            width,
            data,
        })
    }

    /// Build a tensor from records of `length * width` values each.
    pub fn from_rows<I>(length: usize, width: usize, rows: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<[f32]>,
    {
        let row_len = length * width;
        let mut data = Vec::new();
        let mut n = 0usize;
        for row in rows {
            let row = row.as_ref();
            if row.len() != row_len {
                return Err(PrepError::shape(
                    format!("row of {} values", row_len),
                    format!("row {} with {} values", n, row.len()),
                ));
            }
            data.extend_from_slice(row);
            n += 1;
        }
        Ok(Self {
            rows: n,
            length,
            width,
            data,
        })
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.rows, self.length, self.width)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn row_len(&self) -> usize {
        self.length * self.width
    }

    /// The `length * width` values of record `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        let n = self.row_len();
        &self.data[i * n..(i + 1) * n]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        let n = self.row_len();
        &mut self.data[i * n..(i + 1) * n]
    }

    /// The `width` values at position `j` of record `i`.
    #[inline]
    pub fn position(&self, i: usize, j: usize) -> &[f32] {
        let start = (i * self.length + j) * self.width;
        &self.data[start..start + self.width]
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f32 {
        self.data[(i * self.length + j) * self.width + k]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// New tensor whose record `r` is a copy of record `indices[r]`.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    pub fn gather(&self, indices: &[usize]) -> Tensor {
        let n = self.row_len();
        let mut out = Tensor::zeros(indices.len(), self.length, self.width);
        if n > 0 {
            out.data
                .par_chunks_mut(n)
                .zip(indices.par_iter())
                .for_each(|(dst, &i)| dst.copy_from_slice(self.row(i)));
        }
        out
    }

    /// Insert an all-zero record in front of the existing ones.
    pub fn prepend_zero_row(self) -> Tensor {
        let mut data = vec![0.0; self.row_len()];
        data.extend_from_slice(&self.data);
        Tensor {
            rows: self.rows + 1,
            length: self.length,
            width: self.width,
            data,
        }
    }
}
