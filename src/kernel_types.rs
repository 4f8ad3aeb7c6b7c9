//! Kernel-related types shared across backends and ops.

/// Column-major GEMM configuration: `C := alpha * op(A) * op(B) + beta * C`.
///
/// `m`/`n`/`k` describe the logical product — op(A) is `m x k`, op(B) is
/// `k x n`, C is `m x n` — while the leading dimensions are those of the
/// stored (untransposed) matrices, standard BLAS convention. The cuBLAS
/// call and the CPU reference interpret this identically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GemmConfig {
    pub transpose_a: bool,
    pub transpose_b: bool,
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub alpha: f32,
    pub lda: usize,
    pub ldb: usize,
    pub beta: f32,
    pub ldc: usize,
}
