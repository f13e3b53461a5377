//! Tick-scoped Buffers
//!
//! Every image-sized buffer allocated for a tick holds a lease on a
//! [`BufferLedger`]. Dropping the buffer returns the lease, so `live()`
//! is zero whenever no tick is in flight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::Array4;

/// Counts buffers that are still reachable
#[derive(Debug, Clone, Default)]
pub struct BufferLedger {
    live: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl BufferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a lease for a freshly allocated buffer
    pub fn lease(&self) -> BufferLease {
        self.live.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
        BufferLease {
            live: Arc::clone(&self.live),
        }
    }

    /// Buffers allocated and not yet released
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Buffers allocated since start
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }
}

/// Released on drop
#[derive(Debug)]
pub struct BufferLease {
    live: Arc<AtomicUsize>,
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Preprocessed frame, shape `[1, H, W, 3]`, values in [0, 1]
#[derive(Debug)]
pub struct FrameTensor {
    data: Array4<f32>,
    lease: BufferLease,
}

impl FrameTensor {
    pub fn new(data: Array4<f32>, lease: BufferLease) -> Self {
        Self { data, lease }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    /// Split into the raw array and its lease; keep the lease alive until
    /// everything derived from the array is gone.
    pub fn into_parts(self) -> (Array4<f32>, BufferLease) {
        (self.data, self.lease)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lease_released_on_drop() {
        let ledger = BufferLedger::new();
        assert_eq!(ledger.live(), 0);

        let a = ledger.lease();
        let b = ledger.lease();
        assert_eq!(ledger.live(), 2);

        drop(a);
        assert_eq!(ledger.live(), 1);
        drop(b);
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.total(), 2);
    }

    #[test]
    fn test_tensor_parts_keep_lease() {
        let ledger = BufferLedger::new();
        let tensor = FrameTensor::new(Array4::zeros((1, 2, 2, 3)), ledger.lease());
        assert_eq!(tensor.shape(), &[1, 2, 2, 3]);

        let (array, lease) = tensor.into_parts();
        assert_eq!(ledger.live(), 1);
        drop(array);
        assert_eq!(ledger.live(), 1);
        drop(lease);
        assert_eq!(ledger.live(), 0);
    }
}
