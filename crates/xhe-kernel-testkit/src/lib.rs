//! Shared test support for the XHE Kernel crates.
//!
//! [`vectors`] pins content hashes and canonical pulse hashes, [`generators`]
//! holds proptest strategies for addresses and pulses, and [`fixtures`] wraps
//! a kernel over an in-memory store that can be restarted in place.
//!
//! ```rust
//! use xhe_kernel_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, actual) in verify_all_vectors() {
//!     assert!(matches, "{name}: {actual}");
//! }
//! ```
//!
//! ```rust,no_run
//! use xhe_kernel_testkit::fixtures::TestKernel;
//!
//! async fn restart() -> xhe_kernel::Result<()> {
//!     let fixture = TestKernel::new().await?;
//!     fixture.mint(5, "setup").await?;
//!     let fixture = fixture.reopen().await?;
//!     assert_eq!(fixture.balance().await, 105);
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{init_tracing, stranger, strangers, TestKernel};
pub use generators::{pulse_from_params, PulseParams};
pub use vectors::{content_vectors, pulse_vectors, verify_all_vectors, ContentVector, PulseVector};
