//! Identity service implementations

mod memory;

pub use memory::{Account, InMemoryIdentity};
