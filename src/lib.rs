// src/lib.rs

//! Notices to Mariners folio checker library

pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod services;
pub mod utils;
