pub mod arguments;
pub mod blockchain;
pub mod confirmation;
mod error;
pub mod keychain;
pub mod pipeline;
pub mod run;
pub mod setup;
pub mod signer;
pub mod validator;

pub use {error::Error, run::start};
