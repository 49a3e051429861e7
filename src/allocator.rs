//! Global allocator for the `passcrypt` binary.
//!
//! Each operation allocates its chunk buffers, key material and cipher state
//! once up front and reuses them until it ends.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
