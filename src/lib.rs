//! krel - GrapheneOS kernel release pipeline
//!
//! Resolves the latest GrapheneOS, KernelSU, and susfs revisions,
//! derives a deterministic build identity shared across pipeline
//! stages, and publishes tagged releases idempotently.

pub mod cli;
pub mod error;
pub mod http;
pub mod metadata;
pub mod release;
pub mod resolve;

pub use error::{KrelError, KrelResult};
