//! CUDA backend: cuBLAS for the dense multiply, NVRTC-compiled kernels
//! for the element-wise transform and the reductions.
//!
//! Everything runs on the context's default stream, so the GEMM and the
//! kernel launches within one evaluator call execute in program order.
//! Scalar copy-backs drain the stream; the arg-max path additionally
//! synchronizes explicitly between launch and copy to surface launch
//! errors promptly.

use std::sync::Arc;

use cudarc::cublas::CudaBlas;
use cudarc::driver::{
    CudaContext, CudaFunction, CudaModule, CudaSlice, CudaStream, LaunchConfig, PushKernelArg,
};
use cudarc::nvrtc::compile_ptx;

use crate::backend_trait::{BackendError, BackendResult, EvalBackend};
use crate::kernel_types::GemmConfig;
use crate::layout::MatrixDims;

mod gemm;
mod kernels;

use kernels::{
    KERNEL_ARGMAX_VOTE, KERNEL_LOG_MAP, KERNEL_MASKED_LOG_MAP, KERNEL_SOURCE, KERNEL_TRACE_SUM,
};

/// Hard cap on threads per block for the hand-written kernels.
const MAX_BLOCK_DIM: u32 = 1024;

/// Device-resident column-major f32 matrix owned by the CUDA backend.
#[derive(Debug)]
pub struct CudaMatrix {
    rows: usize,
    cols: usize,
    data: CudaSlice<f32>,
}

impl MatrixDims for CudaMatrix {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }
}

/// CUDA backend bound to one device.
pub struct CudaEvaluator {
    _ctx: Arc<CudaContext>,
    stream: Arc<CudaStream>,
    blas: CudaBlas,
    _module: Arc<CudaModule>,
    log_map: CudaFunction,
    masked_log_map: CudaFunction,
    argmax_vote: CudaFunction,
    trace_sum: CudaFunction,
}

impl CudaEvaluator {
    /// Bind device `ordinal`, create the cuBLAS handle, and compile the
    /// kernel module.
    pub fn new(ordinal: usize) -> BackendResult<Self> {
        let ctx = CudaContext::new(ordinal)?;
        let stream = ctx.default_stream();
        let blas = CudaBlas::new(stream.clone())
            .map_err(|err| BackendError::Cuda(format!("cublas handle init failed: {err:?}")))?;
        let ptx =
            compile_ptx(KERNEL_SOURCE).map_err(|err| BackendError::Compile(format!("{err:?}")))?;
        let module = ctx.load_module(ptx)?;
        let log_map = module
            .load_function(KERNEL_LOG_MAP)
            .map_err(|_| BackendError::KernelMissing(KERNEL_LOG_MAP))?;
        let masked_log_map = module
            .load_function(KERNEL_MASKED_LOG_MAP)
            .map_err(|_| BackendError::KernelMissing(KERNEL_MASKED_LOG_MAP))?;
        let argmax_vote = module
            .load_function(KERNEL_ARGMAX_VOTE)
            .map_err(|_| BackendError::KernelMissing(KERNEL_ARGMAX_VOTE))?;
        let trace_sum = module
            .load_function(KERNEL_TRACE_SUM)
            .map_err(|_| BackendError::KernelMissing(KERNEL_TRACE_SUM))?;

        Ok(Self {
            _ctx: ctx,
            stream,
            blas,
            _module: module,
            log_map,
            masked_log_map,
            argmax_vote,
            trace_sum,
        })
    }

    /// 1D launch covering `n` threads, block dim capped at
    /// [`MAX_BLOCK_DIM`]; the kernels grid-stride past the first `n`.
    fn cover(&self, n: usize, what: &str) -> BackendResult<LaunchConfig> {
        let n = u32::try_from(n)
            .map_err(|_| BackendError::InvalidConfig(format!("{what}: thread count exceeds u32")))?;
        let block = n.clamp(1, MAX_BLOCK_DIM);
        let grid = n.div_ceil(block).max(1);
        Ok(LaunchConfig {
            grid_dim: (grid, 1, 1),
            block_dim: (block, 1, 1),
            shared_mem_bytes: 0,
        })
    }
}

fn idim(value: usize, what: &str) -> BackendResult<i32> {
    i32::try_from(value)
        .map_err(|_| BackendError::InvalidConfig(format!("{what}: dimension exceeds i32: {value}")))
}

impl EvalBackend for CudaEvaluator {
    type Matrix = CudaMatrix;

    fn alloc_zeroed(&self, rows: usize, cols: usize) -> BackendResult<CudaMatrix> {
        let data = self.stream.alloc_zeros::<f32>(rows * cols)?;
        Ok(CudaMatrix { rows, cols, data })
    }

    fn upload(&self, rows: usize, cols: usize, data: &[f32]) -> BackendResult<CudaMatrix> {
        assert_eq!(
            data.len(),
            rows * cols,
            "host buffer length does not match {rows}x{cols}"
        );
        let data = self.stream.memcpy_stod(data)?;
        Ok(CudaMatrix { rows, cols, data })
    }

    fn download(&self, m: &CudaMatrix) -> BackendResult<Vec<f32>> {
        Ok(self.stream.memcpy_dtov(&m.data)?)
    }

    fn gemm(
        &self,
        cfg: GemmConfig,
        a: &CudaMatrix,
        b: &CudaMatrix,
        c: &mut CudaMatrix,
    ) -> BackendResult<()> {
        gemm::gemm_f32(&self.blas, cfg, &a.data, &b.data, &mut c.data)
    }

    fn log_map(&self, src: &CudaMatrix, dst: &mut CudaMatrix) -> BackendResult<()> {
        assert!(src.same_shape(dst), "log_map shape mismatch");
        if src.is_empty() {
            return Ok(());
        }
        let cfg = self.cover(src.len(), "log_map")?;
        let rows = idim(src.rows, "log_map rows")?;
        let cols = idim(src.cols, "log_map cols")?;
        unsafe {
            let mut builder = self.stream.launch_builder(&self.log_map);
            builder.arg(&src.data);
            builder.arg(&mut dst.data);
            builder.arg(&rows);
            builder.arg(&cols);
            builder.launch(cfg)
        }?;
        Ok(())
    }

    fn masked_log_map(
        &self,
        src: &CudaMatrix,
        labels: &CudaMatrix,
        dst: &mut CudaMatrix,
    ) -> BackendResult<()> {
        assert!(src.same_shape(labels), "masked_log_map shape mismatch");
        assert!(src.same_shape(dst), "masked_log_map shape mismatch");
        if src.is_empty() {
            return Ok(());
        }
        let cfg = self.cover(src.len(), "masked_log_map")?;
        let rows = idim(src.rows, "masked_log_map rows")?;
        let cols = idim(src.cols, "masked_log_map cols")?;
        unsafe {
            let mut builder = self.stream.launch_builder(&self.masked_log_map);
            builder.arg(&src.data);
            builder.arg(&labels.data);
            builder.arg(&mut dst.data);
            builder.arg(&rows);
            builder.arg(&cols);
            builder.launch(cfg)
        }?;
        Ok(())
    }

    fn argmax_vote(&self, scores: &CudaMatrix, labels: &CudaMatrix) -> BackendResult<u32> {
        assert!(scores.same_shape(labels), "argmax_vote shape mismatch");
        assert!(scores.rows > 0, "argmax over zero rows");
        let mut counter = self.stream.alloc_zeros::<u32>(1)?;
        if scores.cols > 0 {
            let cfg = self.cover(scores.cols, "argmax_vote")?;
            let rows = idim(scores.rows, "argmax_vote rows")?;
            let cols = idim(scores.cols, "argmax_vote cols")?;
            unsafe {
                let mut builder = self.stream.launch_builder(&self.argmax_vote);
                builder.arg(&scores.data);
                builder.arg(&labels.data);
                builder.arg(&rows);
                builder.arg(&cols);
                builder.arg(&mut counter);
                builder.launch(cfg)
            }?;
            // Surface launch errors before the copy-back.
            self.stream.synchronize()?;
        }
        let host = self.stream.memcpy_dtov(&counter)?;
        Ok(host[0])
    }

    fn trace_sum(&self, z: &CudaMatrix) -> BackendResult<f32> {
        // Accumulator zero-initialized before the reduction; atomic adds
        // are the only writes it sees.
        let mut acc = self.stream.alloc_zeros::<f32>(1)?;
        let n = z.rows.min(z.cols);
        if n > 0 {
            let cfg = self.cover(n, "trace_sum")?;
            let rows = idim(z.rows, "trace_sum rows")?;
            let cols = idim(z.cols, "trace_sum cols")?;
            unsafe {
                let mut builder = self.stream.launch_builder(&self.trace_sum);
                builder.arg(&z.data);
                builder.arg(&rows);
                builder.arg(&cols);
                builder.arg(&mut acc);
                builder.launch(cfg)
            }?;
        }
        let host = self.stream.memcpy_dtov(&acc)?;
        Ok(host[0])
    }
}
