//! Column-major layout helpers shared by every kernel and GEMM call site.
//!
//! All dense matrices in this crate are column-major: element (row, col)
//! of a matrix with leading dimension `ld` lives at `row + col * ld`. The
//! hand-written kernels and the cuBLAS arguments must agree on this
//! exactly — a layout mismatch corrupts results without any error signal —
//! so every host-side offset goes through [`col_major`]. The CUDA sources
//! in `cuda_kernels::kernels` inline the same arithmetic.

/// Linear offset of element (row, col) in a column-major matrix with
/// leading dimension `ld`.
#[inline]
pub const fn col_major(row: usize, col: usize, ld: usize) -> usize {
    row + col * ld
}

/// Shape accessors shared by the backend matrix handles.
pub trait MatrixDims {
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;

    /// Total element count.
    fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn same_shape(&self, other: &impl MatrixDims) -> bool {
        self.rows() == other.rows() && self.cols() == other.cols()
    }
}

#[cfg(test)]
mod tests {
    use super::col_major;

    #[test]
    fn col_major_walks_down_columns_first() {
        // 3-row matrix: consecutive offsets vary fastest down a column.
        assert_eq!(col_major(0, 0, 3), 0);
        assert_eq!(col_major(1, 0, 3), 1);
        assert_eq!(col_major(2, 0, 3), 2);
        assert_eq!(col_major(0, 1, 3), 3);
        assert_eq!(col_major(2, 4, 3), 14);
    }
}
