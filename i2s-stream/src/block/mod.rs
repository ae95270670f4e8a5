//! Fixed-size audio block pool.
//!
//! [`BlockPool`] is an arena of [`POOL_SIZE`](crate::constants::POOL_SIZE)
//! blocks; [`AudioBlock`] is the move-only handle that owns one of them.

mod handle;
pub mod pool;

pub use handle::AudioBlock;
pub use pool::{BlockPool, PoolStats};
