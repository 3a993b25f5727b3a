pub mod address;
pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod flows;
pub mod gateway;
pub mod keystore;
pub mod project;
pub mod retry;
pub mod signer;
pub mod tx_builder;

pub use error::{EngineError, EngineResult, ErrorKind};
