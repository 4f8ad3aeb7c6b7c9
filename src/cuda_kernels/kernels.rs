//! CUDA sources for the evaluation kernel family.
//!
//! Compiled to PTX through NVRTC when a [`super::CudaEvaluator`] is
//! created; no precompiled binaries ship with the crate.

pub(crate) const KERNEL_LOG_MAP: &str = "log_map_f32";
pub(crate) const KERNEL_MASKED_LOG_MAP: &str = "masked_log_map_f32";
pub(crate) const KERNEL_ARGMAX_VOTE: &str = "argmax_vote_f32";
pub(crate) const KERNEL_TRACE_SUM: &str = "trace_sum_f32";

// Column-major everywhere: element (row, col) of an R-row matrix lives at
// row + col * R. Must stay in lockstep with layout::col_major on the host.
pub(crate) const KERNEL_SOURCE: &str = r#"
extern "C" __global__ void log_map_f32(
    const float* __restrict__ src,
    float* __restrict__ dst,
    int rows,
    int cols
) {
    long long total = (long long)rows * (long long)cols;
    long long stride = (long long)gridDim.x * blockDim.x;
    for (long long idx = blockIdx.x * (long long)blockDim.x + threadIdx.x;
         idx < total;
         idx += stride) {
        int row = (int)(idx % rows);
        int col = (int)(idx / rows);
        long long off = row + (long long)col * rows;
        dst[off] = logf(src[off]);
    }
}

// Cross-entropy treats 0 * ln(0) as 0: entries with no label mass write
// an exact 0 instead of logf, so the downstream product never sees
// 0 * -inf = NaN. Positive label mass stays unclamped.
extern "C" __global__ void masked_log_map_f32(
    const float* __restrict__ src,
    const float* __restrict__ labels,
    float* __restrict__ dst,
    int rows,
    int cols
) {
    long long total = (long long)rows * (long long)cols;
    long long stride = (long long)gridDim.x * blockDim.x;
    for (long long idx = blockIdx.x * (long long)blockDim.x + threadIdx.x;
         idx < total;
         idx += stride) {
        int row = (int)(idx % rows);
        int col = (int)(idx / rows);
        long long off = row + (long long)col * rows;
        dst[off] = labels[off] > 0.0f ? logf(src[off]) : 0.0f;
    }
}

// One thread per column: sequential scan for the arg-max row (strict >
// keeps the lowest index on ties), then a vote when the label at that row
// is hot. O(rows) work per thread; fine for classifier-sized row counts,
// would not scale to reductions over large row counts.
extern "C" __global__ void argmax_vote_f32(
    const float* __restrict__ scores,
    const float* __restrict__ labels,
    int rows,
    int cols,
    unsigned int* correct
) {
    for (int col = blockIdx.x * blockDim.x + threadIdx.x;
         col < cols;
         col += gridDim.x * blockDim.x) {
        int best = 0;
        float best_val = scores[(long long)col * rows];
        for (int row = 1; row < rows; ++row) {
            float v = scores[row + (long long)col * rows];
            if (v > best_val) {
                best_val = v;
                best = row;
            }
        }
        if (labels[best + (long long)col * rows] >= 0.5f) {
            atomicAdd(correct, 1u);
        }
    }
}

// One thread per diagonal index, atomic add into a zero-initialized
// scalar. A single global atomic is enough at the batch sizes the metric
// pipelines target; large diagonals would want a two-phase block
// reduction instead.
extern "C" __global__ void trace_sum_f32(
    const float* __restrict__ z,
    int rows,
    int cols,
    float* acc
) {
    int n = rows < cols ? rows : cols;
    for (int k = blockIdx.x * blockDim.x + threadIdx.x;
         k < n;
         k += gridDim.x * blockDim.x) {
        atomicAdd(acc, z[k + (long long)k * rows]);
    }
}
"#;
