//! LoRaWAN DevAddr → NetID decoding and per-network device statistics

pub mod activation;
pub mod config;
pub mod lorawan;
pub mod report;
