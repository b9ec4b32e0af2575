pub mod archive;
pub mod bootstrap;
pub mod bundle;
pub mod config;
pub mod error;
pub mod fetch;
pub mod fonts;
pub mod io;
pub mod manifest;
pub mod paths;
pub mod pipeline;
pub mod publish;
pub mod registry;
pub mod remote;
pub mod render;
pub mod shell;
pub mod template;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{McError, Result};
