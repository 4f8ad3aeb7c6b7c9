//! Multinomial log-loss (cross-entropy) over a device-resident
//! probability matrix.

use log::info;

use crate::backend_trait::{BackendResult, EvalBackend};
use crate::kernel_types::GemmConfig;
use crate::layout::MatrixDims;

/// Unnormalized total cross-entropy `-Σ y·ln(p)` over classes and
/// samples; the caller averages by batch size if desired.
///
/// Pipeline: `logP := ln(P)` element-wise, masked by the labels — entries
/// with no label mass write 0, since cross-entropy treats `0 * ln(0)` as
/// 0 and an unmasked `ln` would poison the product with `0 * -inf = NaN`
/// on exact one-hot predictions. Entries with positive label mass stay
/// unclamped: label mass on a zero probability yields `-inf` and
/// propagates. Then `Z := -Yᵀ·logP` (batch × batch) and the trace of `Z`
/// via atomic accumulation into a zero-initialized scalar. The diagonal
/// equals per-sample cross-entropy contributions because the batch
/// dimension appears on both axes of the product.
///
/// No side effects on `p` or `y`; both intermediates are dropped before
/// returning.
pub fn evaluate_log_loss<B: EvalBackend>(
    backend: &B,
    p: &B::Matrix,
    y: &B::Matrix,
    verbose: bool,
) -> BackendResult<f32> {
    assert_eq!(y.rows(), p.rows(), "label/probability row mismatch");
    assert_eq!(y.cols(), p.cols(), "label/probability column mismatch");
    assert!(p.cols() > 0 && p.rows() > 0, "empty batch");

    let mut log_p = backend.alloc_zeroed(p.rows(), p.cols())?;
    backend.masked_log_map(p, y, &mut log_p)?;

    let mut z = backend.alloc_zeroed(y.cols(), log_p.cols())?;
    let cfg = GemmConfig {
        transpose_a: true,
        transpose_b: false,
        m: y.cols(),
        n: log_p.cols(),
        k: y.rows(),
        alpha: -1.0,
        lda: y.rows(),
        ldb: log_p.rows(),
        beta: 0.0,
        ldc: z.rows(),
    };
    backend.gemm(cfg, y, &log_p, &mut z)?;

    let total = backend.trace_sum(&z)?;

    if verbose {
        info!(
            "log-loss: probabilities {}x{}, labels {}x{}, total {}",
            p.rows(),
            p.cols(),
            y.rows(),
            y.cols(),
            total
        );
    }

    Ok(total)
}
