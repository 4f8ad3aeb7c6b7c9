//! CPU reference implementations of the evaluation kernel family.
//!
//! Semantics mirror the CUDA kernels exactly — the same column-major
//! offsets through [`col_major`], the same strict `>` arg-max tie-break,
//! the same zero-initialized reduction targets — so this backend doubles
//! as the test oracle for the GPU path. The GEMM accumulates in f64 to
//! keep the reference numerically tighter than the device.

use crate::backend_trait::{BackendResult, EvalBackend};
use crate::kernel_types::GemmConfig;
use crate::layout::{col_major, MatrixDims};

/// Host-resident column-major f32 matrix owned by the CPU backend.
#[derive(Debug, Clone)]
pub struct CpuMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl CpuMatrix {
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl MatrixDims for CpuMatrix {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }
}

/// CPU reference backend.
#[derive(Debug, Default)]
pub struct CpuEvaluator;

impl CpuEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl EvalBackend for CpuEvaluator {
    type Matrix = CpuMatrix;

    fn alloc_zeroed(&self, rows: usize, cols: usize) -> BackendResult<CpuMatrix> {
        Ok(CpuMatrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        })
    }

    fn upload(&self, rows: usize, cols: usize, data: &[f32]) -> BackendResult<CpuMatrix> {
        assert_eq!(
            data.len(),
            rows * cols,
            "host buffer length does not match {rows}x{cols}"
        );
        Ok(CpuMatrix {
            rows,
            cols,
            data: data.to_vec(),
        })
    }

    fn download(&self, m: &CpuMatrix) -> BackendResult<Vec<f32>> {
        Ok(m.data.clone())
    }

    fn gemm(
        &self,
        cfg: GemmConfig,
        a: &CpuMatrix,
        b: &CpuMatrix,
        c: &mut CpuMatrix,
    ) -> BackendResult<()> {
        cpu_gemm(cfg, &a.data, &b.data, &mut c.data);
        Ok(())
    }

    fn log_map(&self, src: &CpuMatrix, dst: &mut CpuMatrix) -> BackendResult<()> {
        assert!(src.same_shape(dst), "log_map shape mismatch");
        let rows = src.rows;
        if rows == 0 {
            return Ok(());
        }
        // Same linear-index decode the CUDA kernel uses.
        for idx in 0..src.len() {
            let row = idx % rows;
            let col = idx / rows;
            let off = col_major(row, col, rows);
            dst.data[off] = src.data[off].ln();
        }
        Ok(())
    }

    fn masked_log_map(
        &self,
        src: &CpuMatrix,
        labels: &CpuMatrix,
        dst: &mut CpuMatrix,
    ) -> BackendResult<()> {
        assert!(src.same_shape(labels), "masked_log_map shape mismatch");
        assert!(src.same_shape(dst), "masked_log_map shape mismatch");
        let rows = src.rows;
        if rows == 0 {
            return Ok(());
        }
        for idx in 0..src.len() {
            let row = idx % rows;
            let col = idx / rows;
            let off = col_major(row, col, rows);
            dst.data[off] = if labels.data[off] > 0.0 {
                src.data[off].ln()
            } else {
                0.0
            };
        }
        Ok(())
    }

    fn argmax_vote(&self, scores: &CpuMatrix, labels: &CpuMatrix) -> BackendResult<u32> {
        assert!(scores.same_shape(labels), "argmax_vote shape mismatch");
        assert!(scores.rows > 0, "argmax over zero rows");
        let rows = scores.rows;
        let mut correct = 0u32;
        for col in 0..scores.cols {
            let mut best = 0usize;
            let mut best_val = scores.data[col_major(0, col, rows)];
            for row in 1..rows {
                let v = scores.data[col_major(row, col, rows)];
                // Strict > keeps the lowest row index on ties.
                if v > best_val {
                    best_val = v;
                    best = row;
                }
            }
            if labels.data[col_major(best, col, rows)] >= 0.5 {
                correct += 1;
            }
        }
        Ok(correct)
    }

    fn trace_sum(&self, z: &CpuMatrix) -> BackendResult<f32> {
        let n = z.rows.min(z.cols);
        let mut acc = 0.0f32;
        for k in 0..n {
            acc += z.data[col_major(k, k, z.rows)];
        }
        Ok(acc)
    }
}

/// Column-major reference GEMM: `C := alpha * op(A) * op(B) + beta * C`.
///
/// Leading dimensions are those of the stored matrices; transpose flags
/// only change which offsets are read, matching BLAS semantics.
pub fn cpu_gemm(cfg: GemmConfig, a: &[f32], b: &[f32], c: &mut [f32]) {
    let GemmConfig {
        transpose_a,
        transpose_b,
        m,
        n,
        k,
        alpha,
        lda,
        ldb,
        beta,
        ldc,
    } = cfg;

    for j in 0..n {
        for i in 0..m {
            let mut sum = 0.0f64;
            for l in 0..k {
                // op(A)[i, l] is stored at A[i, l] or A[l, i].
                let a_idx = if transpose_a {
                    col_major(l, i, lda)
                } else {
                    col_major(i, l, lda)
                };
                // op(B)[l, j] is stored at B[l, j] or B[j, l].
                let b_idx = if transpose_b {
                    col_major(j, l, ldb)
                } else {
                    col_major(l, j, ldb)
                };
                sum += a[a_idx] as f64 * b[b_idx] as f64;
            }
            let c_idx = col_major(i, j, ldc);
            let seed = if beta != 0.0 {
                beta as f64 * c[c_idx] as f64
            } else {
                0.0
            };
            c[c_idx] = (alpha as f64 * sum + seed) as f32;
        }
    }
}
