pub mod account;
pub mod cli;
pub mod commands;
pub mod config;
pub mod contract;
pub mod contracts;
pub mod keystore;
pub mod logging;
pub mod rpc;
pub mod tx_builder;
pub mod units;

#[cfg(test)]
mod testing;
