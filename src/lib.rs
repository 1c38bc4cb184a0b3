//! Fan chat room messages out into per-language translated copies.
//!
//! A message written to a room's staging record is copied once per supported
//! language: verbatim for its own language, translated for every other one.

pub mod config;
pub mod error;
pub mod fanout;
pub mod i18n;
pub mod message;
pub mod provider;
pub mod retry;
pub mod security;
pub mod server;
pub mod store;
