//! Infrastructure implementations behind the core trait seams.
//!
//! Ships the in-memory `KvStore` used by the composition root and the
//! test suites; a production deployment injects an etcd-backed
//! implementation of the same trait instead.

pub mod mem_store;

#[cfg(test)]
mod mem_store_test;

pub use mem_store::MemStore;
