//! CUDA backend vs CPU reference, within floating-point tolerance.
//!
//! These tests need a CUDA device and skip (with a log line) when one is
//! not available, so the suite stays green on CPU-only machines.

#![cfg(feature = "cuda")]

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use linclf_kernels::{
    col_major, evaluate_accuracy, evaluate_log_loss, CpuEvaluator, CudaEvaluator, EvalBackend,
};

fn cuda_or_skip(test: &str) -> Option<CudaEvaluator> {
    let _ = env_logger::builder().is_test(true).try_init();
    match CudaEvaluator::new(0) {
        Ok(backend) => Some(backend),
        Err(err) => {
            log::warn!("skipping {test}: no usable CUDA device ({err})");
            None
        }
    }
}

fn random_matrix(rng: &mut StdRng, n: usize, lo: f32, hi: f32) -> Vec<f32> {
    (0..n).map(|_| rng.gen_range(lo..hi)).collect()
}

fn one_hot(rows: usize, hot_rows: &[usize]) -> Vec<f32> {
    let mut data = vec![0.0; rows * hot_rows.len()];
    for (col, &row) in hot_rows.iter().enumerate() {
        data[col_major(row, col, rows)] = 1.0;
    }
    data
}

#[test]
fn cuda_accuracy_matches_cpu_reference() {
    let Some(gpu) = cuda_or_skip("cuda_accuracy_matches_cpu_reference") else {
        return;
    };
    let cpu = CpuEvaluator::new();
    let mut rng = StdRng::seed_from_u64(42);

    let classes = 5;
    let features = 8;
    let batch = 33;
    let w_host = random_matrix(&mut rng, features * classes, -1.0, 1.0);
    let x_host = random_matrix(&mut rng, features * batch, -1.0, 1.0);
    let hot: Vec<usize> = (0..batch).map(|_| rng.gen_range(0..classes)).collect();
    let y_host = one_hot(classes, &hot);

    let w = gpu.upload(features, classes, &w_host).unwrap();
    let x = gpu.upload(features, batch, &x_host).unwrap();
    let y = gpu.upload(classes, batch, &y_host).unwrap();
    let mut z = gpu.alloc_zeroed(classes, batch).unwrap();
    let gpu_acc = evaluate_accuracy(&gpu, &w, &x, &y, &mut z, true).unwrap();

    let w = cpu.upload(features, classes, &w_host).unwrap();
    let x = cpu.upload(features, batch, &x_host).unwrap();
    let y = cpu.upload(classes, batch, &y_host).unwrap();
    let mut z_ref = cpu.alloc_zeroed(classes, batch).unwrap();
    let cpu_acc = evaluate_accuracy(&cpu, &w, &x, &y, &mut z_ref, false).unwrap();

    // Accuracy is a count ratio; both backends must agree exactly unless
    // a score sits within GEMM rounding of a tie, which this data avoids.
    assert_abs_diff_eq!(gpu_acc, cpu_acc, epsilon = 1e-6);

    // The accumulated score matrices agree within sgemm tolerance.
    let gpu_scores = gpu.download(&z).unwrap();
    let cpu_scores = cpu.download(&z_ref).unwrap();
    for (g, c) in gpu_scores.iter().zip(&cpu_scores) {
        assert_abs_diff_eq!(*g, *c, epsilon = 1e-3);
    }
}

#[test]
fn cuda_log_loss_matches_cpu_reference() {
    let Some(gpu) = cuda_or_skip("cuda_log_loss_matches_cpu_reference") else {
        return;
    };
    let cpu = CpuEvaluator::new();
    let mut rng = StdRng::seed_from_u64(7);

    let classes = 6;
    let batch = 40;
    let mut probs = random_matrix(&mut rng, classes * batch, 0.0, 1.0);
    for col in 0..batch {
        let sum: f32 = (0..classes)
            .map(|row| probs[col_major(row, col, classes)] + 1e-3)
            .sum();
        for row in 0..classes {
            let off = col_major(row, col, classes);
            probs[off] = (probs[off] + 1e-3) / sum;
        }
    }
    let hot: Vec<usize> = (0..batch).map(|_| rng.gen_range(0..classes)).collect();
    let y_host = one_hot(classes, &hot);

    let p = gpu.upload(classes, batch, &probs).unwrap();
    let y = gpu.upload(classes, batch, &y_host).unwrap();
    let gpu_total = evaluate_log_loss(&gpu, &p, &y, true).unwrap();

    let p = cpu.upload(classes, batch, &probs).unwrap();
    let y = cpu.upload(classes, batch, &y_host).unwrap();
    let cpu_total = evaluate_log_loss(&cpu, &p, &y, false).unwrap();

    // Atomic accumulation order differs run to run; tolerance, not bits.
    assert_abs_diff_eq!(gpu_total, cpu_total, epsilon = 1e-2 * cpu_total.abs().max(1.0));
}

#[test]
fn cuda_log_loss_of_perfect_one_hot_is_zero() {
    let Some(gpu) = cuda_or_skip("cuda_log_loss_of_perfect_one_hot_is_zero") else {
        return;
    };

    // Exact one-hot predictions: cold entries hold exact zeros, which
    // must contribute 0 (not 0 * -inf = NaN) to the total.
    let classes = 4;
    let labels: Vec<usize> = (0..9).map(|c| c % classes).collect();
    let hot = one_hot(classes, &labels);
    let p = gpu.upload(classes, labels.len(), &hot).unwrap();
    let y = gpu.upload(classes, labels.len(), &hot).unwrap();

    let total = evaluate_log_loss(&gpu, &p, &y, false).unwrap();
    assert!(total.is_finite(), "got {total}");
    assert_abs_diff_eq!(total, 0.0, epsilon = 1e-6);
}

#[test]
fn cuda_log_map_respects_column_major_layout() {
    let Some(gpu) = cuda_or_skip("cuda_log_map_respects_column_major_layout") else {
        return;
    };

    let rows = 7;
    let cols = 11;
    let src_host: Vec<f32> = (0..rows * cols).map(|i| (i as f32 / 16.0).exp()).collect();
    let src = gpu.upload(rows, cols, &src_host).unwrap();
    let mut dst = gpu.alloc_zeroed(rows, cols).unwrap();
    gpu.log_map(&src, &mut dst).unwrap();
    let out = gpu.download(&dst).unwrap();

    // Check first, last, and interior coordinates through the shared
    // offset convention.
    for (row, col) in [(0, 0), (rows - 1, cols - 1), (3, 5), (6, 0)] {
        let off = col_major(row, col, rows);
        assert_abs_diff_eq!(out[off], off as f32 / 16.0, epsilon = 1e-4);
    }
}

#[test]
fn cuda_argmax_tie_break_matches_cpu() {
    let Some(gpu) = cuda_or_skip("cuda_argmax_tie_break_matches_cpu") else {
        return;
    };

    let scores = gpu.upload(2, 1, &[0.5, 0.5]).unwrap();
    let label_row0 = gpu.upload(2, 1, &[1.0, 0.0]).unwrap();
    let label_row1 = gpu.upload(2, 1, &[0.0, 1.0]).unwrap();
    assert_eq!(gpu.argmax_vote(&scores, &label_row0).unwrap(), 1);
    assert_eq!(gpu.argmax_vote(&scores, &label_row1).unwrap(), 0);
}
