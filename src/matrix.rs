//! Contention matrix
//!
//! An N×N boolean table declaring which lock modes conflict. Rows are indexed
//! by the *held* mode, columns by the *requested* mode: `true` means a held
//! lock in the row mode blocks a new request in the column mode. The table
//! need not be symmetric.

use serde::{Deserialize, Serialize};

use crate::mode::LockMode;

/// Mode contention table, fixed at lock manager construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentionMatrix {
    modes: usize,
    /// Row-major: `cells[held * modes + requested]`.
    cells: Vec<bool>,
}

impl ContentionMatrix {
    /// Create a matrix for `modes` lock modes with no contention declared.
    pub fn new(modes: usize) -> Self {
        assert!(modes > 0, "contention matrix needs at least one mode");
        Self {
            modes,
            cells: vec![false; modes * modes],
        }
    }

    /// Build a matrix from nested rows, row indexed by held mode.
    pub fn from_rows<const N: usize>(rows: [[bool; N]; N]) -> Self {
        let mut matrix = Self::new(N);
        for (held, row) in rows.iter().enumerate() {
            for (requested, &contends) in row.iter().enumerate() {
                matrix.set(held, requested, contends);
            }
        }
        matrix
    }

    /// The canonical read-write table: reads share, writes exclude everything.
    pub fn read_write() -> Self {
        Self::from_rows([[false, true], [true, true]])
    }

    /// Declare whether a held `held`-mode lock blocks a `requested`-mode
    /// request. Intended for table construction, before the matrix is handed
    /// to a lock manager.
    pub fn set(&mut self, held: usize, requested: usize, contends: bool) {
        let cell = self.cell(held, requested);
        self.cells[cell] = contends;
    }

    /// Check whether a held lock in `held` mode blocks a request in
    /// `requested` mode.
    pub fn conflicts<M: LockMode>(&self, held: M, requested: M) -> bool {
        self.cells[self.cell(held.index(), requested.index())]
    }

    /// Number of lock modes covered by the table.
    pub fn modes(&self) -> usize {
        self.modes
    }

    fn cell(&self, held: usize, requested: usize) -> usize {
        assert!(
            held < self.modes && requested < self.modes,
            "mode index out of bounds: ({}, {}) with {} modes",
            held,
            requested,
            self.modes
        );
        held * self.modes + requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::RwMode;

    #[test]
    fn test_read_write_matrix() {
        let matrix = ContentionMatrix::read_write();
        assert!(!matrix.conflicts(RwMode::Read, RwMode::Read));
        assert!(matrix.conflicts(RwMode::Read, RwMode::Write));
        assert!(matrix.conflicts(RwMode::Write, RwMode::Read));
        assert!(matrix.conflicts(RwMode::Write, RwMode::Write));
    }

    #[test]
    fn test_asymmetric_table() {
        // A held 0-mode lock blocks 1-mode requests, but not vice versa.
        let matrix = ContentionMatrix::from_rows([[false, true], [false, false]]);
        #[derive(Clone, Copy)]
        struct Raw(usize);
        impl LockMode for Raw {
            fn index(self) -> usize {
                self.0
            }
        }
        assert!(matrix.conflicts(Raw(0), Raw(1)));
        assert!(!matrix.conflicts(Raw(1), Raw(0)));
    }

    #[test]
    fn test_new_matrix_has_no_contention() {
        let matrix = ContentionMatrix::new(2);
        assert!(!matrix.conflicts(RwMode::Write, RwMode::Write));
        assert_eq!(matrix.modes(), 2);
    }

    #[test]
    #[should_panic(expected = "mode index out of bounds")]
    fn test_out_of_bounds_mode_panics() {
        let mut matrix = ContentionMatrix::new(2);
        matrix.set(2, 0, true);
    }
}
