//! Classification accuracy over a device-resident score matrix.

use log::info;

use crate::backend_trait::{BackendResult, EvalBackend};
use crate::kernel_types::GemmConfig;
use crate::layout::MatrixDims;

/// Fraction of columns whose arg-max score row carries the one-hot label.
///
/// Computes `Z := Wᵀ·X + Z` in place (beta = 1: callers must zero `Z`
/// beforehand unless they intend the accumulate — the mutation is part of
/// the contract), then runs one vote per column: the arg-max row of the
/// column (ties keep the lowest index) counts as correct when
/// `Y[argmax, col] >= 0.5`. Returns `correct / Z.cols`.
///
/// Shapes are programmer-supplied invariants and assert on violation. A
/// GEMM failure is returned as a typed error; the vote never runs over a
/// possibly-unwritten score matrix.
pub fn evaluate_accuracy<B: EvalBackend>(
    backend: &B,
    w: &B::Matrix,
    x: &B::Matrix,
    y: &B::Matrix,
    z: &mut B::Matrix,
    verbose: bool,
) -> BackendResult<f32> {
    assert_eq!(y.rows(), z.rows(), "label/score row mismatch");
    assert_eq!(y.cols(), z.cols(), "label/score column mismatch");
    assert_eq!(w.rows(), x.rows(), "weight/feature inner dimension mismatch");
    assert_eq!(z.rows(), w.cols(), "score rows must equal class count");
    assert_eq!(z.cols(), x.cols(), "score columns must equal batch size");
    assert!(z.cols() > 0, "empty batch");

    let cfg = GemmConfig {
        transpose_a: true,
        transpose_b: false,
        m: w.cols(),
        n: x.cols(),
        k: w.rows(),
        alpha: 1.0,
        lda: w.rows(),
        ldb: x.rows(),
        beta: 1.0,
        ldc: z.rows(),
    };
    backend.gemm(cfg, w, x, z)?;

    let correct = backend.argmax_vote(z, y)?;

    if verbose {
        info!(
            "accuracy: scores {}x{}, labels {}x{}, correct {}/{}",
            z.rows(),
            z.cols(),
            y.rows(),
            y.cols(),
            correct,
            z.cols()
        );
    }

    // Divisor is always the score matrix's column count.
    Ok(correct as f32 / z.cols() as f32)
}
