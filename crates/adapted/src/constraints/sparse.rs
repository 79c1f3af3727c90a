//! Compressed-row storage for constraint matrices.
//!
//! Rows are assembled one at a time through a sparse accumulator, so repeated
//! contributions to the same column (nested cells in refinement rows) are
//! summed before the row is frozen. Column indices within a row are sorted.

use nalgebra::{DMatrix, DVector};

use crate::cfg::DROP_EPS;

/// Immutable CSR matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct CsrMatrix {
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    #[inline]
    pub fn nrows(&self) -> usize {
        self.row_ptr.len() - 1
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored non-zeros.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Fraction of stored entries among `nrows · ncols`.
    pub fn density(&self) -> f64 {
        let total = self.nrows() * self.ncols;
        if total == 0 {
            0.0
        } else {
            self.nnz() as f64 / total as f64
        }
    }

    /// Column indices and values of row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let (lo, hi) = (self.row_ptr[i], self.row_ptr[i + 1]);
        (&self.col_idx[lo..hi], &self.values[lo..hi])
    }

    /// Entry `(i, j)`, zero when not stored.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (cols, vals) = self.row(i);
        cols.binary_search(&j).map(|k| vals[k]).unwrap_or(0.0)
    }

    /// `A x`.
    ///
    /// Panics if `x.len() != ncols`.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.ncols, "dimension mismatch in CSR product");
        DVector::from_iterator(
            self.nrows(),
            (0..self.nrows()).map(|i| {
                let (cols, vals) = self.row(i);
                cols.iter().zip(vals).map(|(&j, &v)| v * x[j]).sum::<f64>()
            }),
        )
    }

    /// Dense copy; intended for small systems and tests only.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(self.nrows(), self.ncols);
        for i in 0..self.nrows() {
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                m[(i, j)] = v;
            }
        }
        m
    }
}

/// Row-by-row CSR assembler with a dense scatter buffer of width `ncols`.
#[derive(Debug)]
pub struct CsrBuilder {
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
    acc: Vec<f64>,
    touched: Vec<usize>,
    marked: Vec<bool>,
}

impl CsrBuilder {
    pub fn new(ncols: usize) -> Self {
        Self {
            ncols,
            row_ptr: vec![0],
            col_idx: Vec::new(),
            values: Vec::new(),
            acc: vec![0.0; ncols],
            touched: Vec::new(),
            marked: vec![false; ncols],
        }
    }

    /// Add `v` to column `j` of the row under construction.
    #[inline]
    pub fn add(&mut self, j: usize, v: f64) {
        if !self.marked[j] {
            self.marked[j] = true;
            self.touched.push(j);
        }
        self.acc[j] += v;
    }

    /// Freeze the current row; entries that cancelled to (near) zero are dropped.
    pub fn finish_row(&mut self) {
        self.touched.sort_unstable();
        for &j in &self.touched {
            let v = std::mem::take(&mut self.acc[j]);
            self.marked[j] = false;
            if v.abs() > DROP_EPS {
                self.col_idx.push(j);
                self.values.push(v);
            }
        }
        self.touched.clear();
        self.row_ptr.push(self.col_idx.len());
    }

    /// Rows finished so far.
    #[inline]
    pub fn rows(&self) -> usize {
        self.row_ptr.len() - 1
    }

    pub fn build(self) -> CsrMatrix {
        debug_assert!(self.touched.is_empty(), "unfinished row dropped");
        CsrMatrix {
            ncols: self.ncols,
            row_ptr: self.row_ptr,
            col_idx: self.col_idx,
            values: self.values,
        }
    }
}
