use rand::Rng;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::ops::{Add, Sub, Mul};

/// Row-major dense matrix backed by one contiguous buffer.
///
/// Rows are batch items, columns are features/activations. Element (r, c)
/// lives at `data[r * cols + c]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Matrix {
        assert_eq!(data.len(), rows * cols, "data length does not match {rows}x{cols}");
        Matrix { rows, cols, data }
    }

    /// Builds a matrix from row vectors; all rows must share one length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Matrix {
        let cols = rows.first().map_or(0, |r| r.len());
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for row in rows {
            assert_eq!(row.len(), cols, "rows must have equal length");
            data.extend(row);
        }
        Matrix { rows: n, cols, data }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Overwrites `self` with `other`, reusing the existing allocation.
    pub fn copy_from(&mut self, other: &Matrix) {
        self.rows = other.rows;
        self.cols = other.cols;
        self.data.clear();
        self.data.extend_from_slice(&other.data);
    }

    /// Copies the given rows, in order, into a new matrix.
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        let mut res = Matrix::zeros(indices.len(), self.cols);
        for (dst, &src) in indices.iter().enumerate() {
            res.row_mut(dst).copy_from_slice(self.row(src));
        }
        res
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    pub fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Draw two independent uniform samples in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Glorot (Xavier) normal initialization: N(0, sqrt(2 / (fan_in + fan_out))).
    ///
    /// Keeps the variance of activations and gradients roughly equal across
    /// layers. The fans are passed explicitly so convolution filters can
    /// report their receptive field instead of the matrix shape.
    pub fn glorot<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        fan_in: usize,
        fan_out: usize,
        rng: &mut R,
    ) -> Matrix {
        let std_dev = (2.0 / (fan_in + fan_out).max(1) as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for v in res.data.iter_mut() {
            *v = Matrix::sample_standard_normal(rng) * std_dev;
        }
        res
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// `self · rhs`, one output row per parallel task.
    pub fn dot(&self, rhs: &Matrix) -> Matrix {
        assert_eq!(self.cols, rhs.rows, "Matrices are of incorrect sizes");
        let mut res = Matrix::zeros(self.rows, rhs.cols);
        if res.data.is_empty() {
            return res;
        }
        let cols = rhs.cols;
        res.data
            .par_chunks_mut(cols)
            .zip(self.data.par_chunks(self.cols.max(1)))
            .for_each(|(out, a)| {
                for (k, &a_k) in a.iter().enumerate() {
                    if a_k == 0.0 {
                        continue;
                    }
                    let b = &rhs.data[k * cols..(k + 1) * cols];
                    for (o, &b_kj) in out.iter_mut().zip(b) {
                        *o += a_k * b_kj;
                    }
                }
            });
        res
    }

    /// `selfᵀ · rhs` without materializing the transpose.
    pub fn t_dot(&self, rhs: &Matrix) -> Matrix {
        assert_eq!(self.rows, rhs.rows, "Matrices are of incorrect sizes");
        let mut res = Matrix::zeros(self.cols, rhs.cols);
        if res.data.is_empty() {
            return res;
        }
        let cols = rhs.cols;
        res.data
            .par_chunks_mut(cols)
            .enumerate()
            .for_each(|(i, out)| {
                for k in 0..self.rows {
                    let a_ki = self.data[k * self.cols + i];
                    if a_ki == 0.0 {
                        continue;
                    }
                    let b = &rhs.data[k * cols..(k + 1) * cols];
                    for (o, &b_kj) in out.iter_mut().zip(b) {
                        *o += a_ki * b_kj;
                    }
                }
            });
        res
    }

    /// `self · rhsᵀ` without materializing the transpose.
    pub fn dot_t(&self, rhs: &Matrix) -> Matrix {
        assert_eq!(self.cols, rhs.cols, "Matrices are of incorrect sizes");
        let mut res = Matrix::zeros(self.rows, rhs.rows);
        if res.data.is_empty() {
            return res;
        }
        res.data
            .par_chunks_mut(rhs.rows)
            .enumerate()
            .for_each(|(i, out)| {
                let a = self.row(i);
                for (j, o) in out.iter_mut().enumerate() {
                    *o = a.iter().zip(rhs.row(j)).map(|(x, y)| x * y).sum();
                }
            });
        res
    }

    /// Sum over rows, one value per column.
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for r in 0..self.rows {
            for (s, v) in sums.iter_mut().zip(self.row(r)) {
                *s += v;
            }
        }
        sums
    }

    /// Index of the largest value in each row; first maximum wins.
    pub fn row_argmax(&self) -> Vec<usize> {
        (0..self.rows)
            .map(|r| {
                let row = self.row(r);
                let mut best = 0;
                for (i, &v) in row.iter().enumerate() {
                    if v > row[best] {
                        best = i;
                    }
                }
                best
            })
            .collect()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&rhs.data).map(|(a, b)| a + b).collect(),
        }
    }
}

impl Sub for &Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&rhs.data).map(|(a, b)| a - b).collect(),
        }
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        self.dot(rhs)
    }
}
