//! On-chain collaborators of the maker: contract bindings for the 0x v2
//! exchange and the tokens it moves, plus the known deployments.

pub mod alloy;
pub mod networks;

pub use networks::{Addresses, Network};
