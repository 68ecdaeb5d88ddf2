//! CLI command implementations

pub mod env;
pub mod gate;
pub mod metadata;
pub mod publish;

pub use env::execute as env;
pub use gate::execute as gate;
pub use metadata::execute as metadata;
pub use publish::execute as publish;
