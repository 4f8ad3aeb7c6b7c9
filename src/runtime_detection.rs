//! Runtime backend detection with process-lifetime caching.

use std::sync::OnceLock;

/// Available execution backends, probed in priority order CUDA → CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Cuda,
    Cpu,
}

impl BackendType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cuda => "CUDA",
            Self::Cpu => "CPU",
        }
    }
}

static DETECTED: OnceLock<BackendType> = OnceLock::new();

/// Detect the best available backend, once per process.
pub fn detect_backend() -> BackendType {
    *DETECTED.get_or_init(|| {
        let backend = if try_cuda() {
            BackendType::Cuda
        } else {
            BackendType::Cpu
        };
        log::info!("auto-detected backend: {}", backend.name());
        backend
    })
}

#[cfg(feature = "cuda")]
fn try_cuda() -> bool {
    use cudarc::driver::result;

    match result::init() {
        Ok(_) => {
            log::debug!("CUDA driver initialized");
            true
        }
        Err(err) => {
            log::debug!("CUDA not available: {err:?}");
            false
        }
    }
}

#[cfg(not(feature = "cuda"))]
fn try_cuda() -> bool {
    false
}
