// src/services/mod.rs
pub mod aggregator;
pub mod barometers;
pub mod cache;
pub mod calculations;
pub mod market;
pub mod runner;
pub mod signals;
pub mod storage;
pub mod summary;
pub mod yahoo;

#[cfg(test)]
pub(crate) mod testing;
