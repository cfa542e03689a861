//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use xhe_kernel::{Kernel, KernelConfig, Result};
use xhe_kernel_core::Address;
use xhe_kernel_store::MemoryStore;

/// A kernel over a shared in-memory store.
///
/// The store outlives the kernel, so [`TestKernel::reopen`] simulates a
/// process restart.
pub struct TestKernel {
    pub store: Arc<MemoryStore>,
    pub kernel: Kernel<Arc<MemoryStore>>,
    config: KernelConfig,
}

impl TestKernel {
    /// Open a kernel over an empty store.
    pub async fn new() -> Result<Self> {
        Self::with_config(KernelConfig::default()).await
    }

    /// Open a kernel over an empty store with a custom config.
    pub async fn with_config(config: KernelConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let kernel = Kernel::open(store.clone(), config.clone()).await?;
        Ok(Self {
            store,
            kernel,
            config,
        })
    }

    /// Shut the kernel down and open a new one over the same store.
    pub async fn reopen(self) -> Result<Self> {
        let Self {
            store,
            kernel,
            config,
        } = self;
        kernel.shutdown().await;
        let kernel = Kernel::open(store.clone(), config.clone()).await?;
        Ok(Self {
            store,
            kernel,
            config,
        })
    }

    /// The current identity's did.
    pub async fn did(&self) -> String {
        self.kernel.identity().await.did
    }
}

impl std::ops::Deref for TestKernel {
    type Target = Kernel<Arc<MemoryStore>>;

    fn deref(&self) -> &Self::Target {
        &self.kernel
    }
}

/// A deterministic foreign did, distinct for each `n`.
pub fn stranger(n: u8) -> String {
    Address::Identity {
        id: format!("{:02x}", n).repeat(16),
    }
    .to_string()
}

/// Several distinct foreign dids.
pub fn strangers(count: u8) -> Vec<String> {
    (0..count).map(stranger).collect()
}

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
