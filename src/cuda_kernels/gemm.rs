//! cuBLAS sgemm wrapper for the CUDA backend.

use std::os::raw::c_int;

use cudarc::cublas::result::CublasError;
use cudarc::cublas::sys::cublasOperation_t;
use cudarc::cublas::{CudaBlas, Gemm, GemmConfig as CublasGemmConfig};
use cudarc::driver::CudaSlice;

use crate::backend_trait::{BackendError, BackendResult};
use crate::kernel_types::GemmConfig;

fn op(transpose: bool) -> cublasOperation_t {
    if transpose {
        cublasOperation_t::CUBLAS_OP_T
    } else {
        cublasOperation_t::CUBLAS_OP_N
    }
}

fn dim(value: usize, name: &str) -> BackendResult<c_int> {
    c_int::try_from(value)
        .map_err(|_| BackendError::InvalidConfig(format!("gemm {name} exceeds i32: {value}")))
}

/// `C := alpha * op(A) * op(B) + beta * C`, column-major.
///
/// A non-success cuBLAS status is returned as [`BackendError::Gemm`]
/// carrying the status name; the output buffer must be treated as
/// unwritten in that case.
pub(crate) fn gemm_f32(
    blas: &CudaBlas,
    cfg: GemmConfig,
    a: &CudaSlice<f32>,
    b: &CudaSlice<f32>,
    c: &mut CudaSlice<f32>,
) -> BackendResult<()> {
    let cublas_cfg = CublasGemmConfig {
        transa: op(cfg.transpose_a),
        transb: op(cfg.transpose_b),
        m: dim(cfg.m, "m")?,
        n: dim(cfg.n, "n")?,
        k: dim(cfg.k, "k")?,
        alpha: cfg.alpha,
        lda: dim(cfg.lda, "lda")?,
        ldb: dim(cfg.ldb, "ldb")?,
        beta: cfg.beta,
        ldc: dim(cfg.ldc, "ldc")?,
    };

    unsafe { blas.gemm(cublas_cfg, a, b, c) }.map_err(|err| BackendError::Gemm {
        status: cublas_status_name(&err),
        m: cfg.m,
        n: cfg.n,
        k: cfg.k,
    })
}

/// Human-readable name for a cuBLAS status, for diagnostics.
pub(crate) fn cublas_status_name(err: &CublasError) -> &'static str {
    use cudarc::cublas::sys::cublasStatus_t as S;

    #[allow(unreachable_patterns)]
    match err.0 {
        S::CUBLAS_STATUS_SUCCESS => "CUBLAS_STATUS_SUCCESS",
        S::CUBLAS_STATUS_NOT_INITIALIZED => "CUBLAS_STATUS_NOT_INITIALIZED",
        S::CUBLAS_STATUS_ALLOC_FAILED => "CUBLAS_STATUS_ALLOC_FAILED",
        S::CUBLAS_STATUS_INVALID_VALUE => "CUBLAS_STATUS_INVALID_VALUE",
        S::CUBLAS_STATUS_ARCH_MISMATCH => "CUBLAS_STATUS_ARCH_MISMATCH",
        S::CUBLAS_STATUS_MAPPING_ERROR => "CUBLAS_STATUS_MAPPING_ERROR",
        S::CUBLAS_STATUS_EXECUTION_FAILED => "CUBLAS_STATUS_EXECUTION_FAILED",
        S::CUBLAS_STATUS_INTERNAL_ERROR => "CUBLAS_STATUS_INTERNAL_ERROR",
        S::CUBLAS_STATUS_NOT_SUPPORTED => "CUBLAS_STATUS_NOT_SUPPORTED",
        S::CUBLAS_STATUS_LICENSE_ERROR => "CUBLAS_STATUS_LICENSE_ERROR",
        _ => "CUBLAS_STATUS_UNKNOWN",
    }
}
