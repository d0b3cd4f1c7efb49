use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{NetworkError, Result};

/// Dense row-major matrix. Rows are samples, columns are features/units.
///
/// Arithmetic helpers panic on shape mismatch: inside the training hot path a
/// mismatch is a programmer error, and shapes are validated at the API
/// boundary before any of these run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Weights drawn uniformly from `[-1, 1)`.
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = rng.gen::<f64>() * 2.0 - 1.0;
            }
        }

        res
    }

    pub fn identity(n: usize) -> Matrix {
        let mut res = Matrix::zeros(n, n);
        for i in 0..n {
            res.data[i][i] = 1.0;
        }
        res
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
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
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Element-wise combination of two same-shape matrices.
    pub fn zip_map<F>(&self, rhs: &Matrix, functor: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        self.assert_same_shape(rhs);
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(rhs.data.iter())
                .map(|(a, b)| a.iter().zip(b.iter()).map(|(&x, &y)| functor(x, y)).collect())
                .collect(),
        }
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, rhs: &Matrix) -> Matrix {
        self.zip_map(rhs, |x, y| x * y)
    }

    /// Matrix product `self · rhs`.
    pub fn dot(&self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes: ({}, {}) · ({}, {})",
                   self.rows, self.cols, rhs.rows, rhs.cols)
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..res.cols {
                    res.data[i][j] += a * rhs.data[k][j];
                }
            }
        }

        res
    }

    /// `selfᵀ · rhs` without materialising the transpose.
    pub fn t_dot(&self, rhs: &Matrix) -> Matrix {
        if self.rows != rhs.rows {
            panic!("Matrices are of incorrect sizes: ({}, {})ᵀ · ({}, {})",
                   self.rows, self.cols, rhs.rows, rhs.cols)
        }

        let mut res = Matrix::zeros(self.cols, rhs.cols);
        for (a_row, b_row) in self.data.iter().zip(rhs.data.iter()) {
            for (i, &a) in a_row.iter().enumerate() {
                for (j, &b) in b_row.iter().enumerate() {
                    res.data[i][j] += a * b;
                }
            }
        }
        res
    }

    /// `self · rhsᵀ` without materialising the transpose.
    pub fn dot_t(&self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes: ({}, {}) · ({}, {})ᵀ",
                   self.rows, self.cols, rhs.rows, rhs.cols)
        }

        let mut res = Matrix::zeros(self.rows, rhs.rows);
        for (i, a_row) in self.data.iter().enumerate() {
            for (j, b_row) in rhs.data.iter().enumerate() {
                res.data[i][j] = a_row.iter().zip(b_row.iter()).map(|(a, b)| a * b).sum();
            }
        }
        res
    }

    /// Adds a `(1, cols)` row vector to every row.
    pub fn add_row(&self, row: &Matrix) -> Matrix {
        if row.rows != 1 || row.cols != self.cols {
            panic!("Row vector of shape ({}, {}) cannot broadcast over ({}, {})",
                   row.rows, row.cols, self.rows, self.cols)
        }
        let mut res = self.clone();
        for r in res.data.iter_mut() {
            for (x, b) in r.iter_mut().zip(row.data[0].iter()) {
                *x += b;
            }
        }
        res
    }

    /// Column sums as a `(1, cols)` matrix.
    pub fn sum_rows(&self) -> Matrix {
        let mut res = Matrix::zeros(1, self.cols);
        for row in &self.data {
            for (acc, x) in res.data[0].iter_mut().zip(row.iter()) {
                *acc += x;
            }
        }
        res
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().flat_map(|row| row.iter()).sum()
    }

    pub fn scale(&mut self, factor: f64) {
        for x in self.data.iter_mut().flat_map(|row| row.iter_mut()) {
            *x *= factor;
        }
    }

    /// `self += factor * rhs`.
    pub fn add_scaled(&mut self, rhs: &Matrix, factor: f64) {
        self.assert_same_shape(rhs);
        for (a, b) in self.data.iter_mut().zip(rhs.data.iter()) {
            for (x, y) in a.iter_mut().zip(b.iter()) {
                *x += factor * y;
            }
        }
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i]
    }

    /// New matrix made of the given rows, in order. Indices may repeat.
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        Matrix {
            rows: indices.len(),
            cols: self.cols,
            data: indices.iter().map(|&i| self.data[i].clone()).collect(),
        }
    }

    /// Index of the largest entry of every row. Ties resolve to the first.
    pub fn argmax_rows(&self) -> Vec<usize> {
        self.data.iter().map(|row| argmax(row)).collect()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Builds a matrix from rows. An empty input yields a `(0, 0)` matrix.
    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |row| row.len()),
            data
        }
    }

    /// Like [`Matrix::from_data`] but rejects ragged rows.
    pub fn try_from_data(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let cols = data.first().map_or(0, |row| row.len());
        if let Some((i, row)) = data.iter().enumerate().find(|(_, row)| row.len() != cols) {
            return Err(NetworkError::InvalidData(format!(
                "row {} has {} columns, expected {}", i, row.len(), cols
            )));
        }
        Ok(Matrix::from_data(data))
    }

    fn assert_same_shape(&self, rhs: &Matrix) {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes: ({}, {}) vs ({}, {})",
                   self.rows, self.cols, rhs.rows, rhs.cols)
        }
    }
}

/// Index of the maximum element in a slice.
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_i, best), (i, &x)| {
            if x > best { (i, x) } else { (best_i, best) }
        })
        .0
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}
