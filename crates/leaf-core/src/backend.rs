//! Backend selection for the Burn framework.
//!
//! The pipeline trains on the portable NdArray (CPU) backend. The aliases
//! keep backend choice in one place so a GPU backend can be swapped in
//! without touching the rest of the workspace.

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};

/// Inference backend.
pub type DefaultBackend = NdArray;

/// Autodiff backend used for training.
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Returns the default device for the configured backend.
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

/// Human-readable name of the active backend.
pub fn backend_name() -> &'static str {
    "ndarray (CPU)"
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Tensor;

    #[test]
    fn test_default_device_usable() {
        let device = default_device();
        let tensor = Tensor::<DefaultBackend, 1>::zeros([4], &device);
        assert_eq!(tensor.dims(), [4]);
    }

    #[test]
    fn test_backend_name() {
        assert!(!backend_name().is_empty());
    }
}
