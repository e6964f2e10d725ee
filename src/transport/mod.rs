//! Transport layer: terminal commands and the web form

pub mod cli;
pub mod http;
