//! Port traits at the domain boundary.

pub mod bar_parser;
pub mod config_port;
pub mod record_store;
pub mod source_port;
