use serde::{Deserialize, Serialize};
use std::fmt;

/// Row-major matrix of 32-bit integers, the payload of every inbound numeric frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntMatrix {
    rows: usize,
    cols: usize,
    data: Vec<i32>,
}

impl IntMatrix {
    /// Returns `None` when `data` does not hold exactly `rows * cols` values.
    pub fn new(rows: usize, cols: usize, data: Vec<i32>) -> Option<Self> {
        if rows.checked_mul(cols)? != data.len() {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    pub fn row_vector(data: Vec<i32>) -> Self {
        Self {
            rows: 1,
            cols: data.len(),
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<i32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    pub fn row(&self, row: usize) -> Option<&[i32]> {
        if row >= self.rows {
            return None;
        }
        Some(&self.data[row * self.cols..(row + 1) * self.cols])
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }
}

impl fmt::Display for IntMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            let row = &self.data[r * self.cols..(r + 1) * self.cols];
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        Ok(())
    }
}
