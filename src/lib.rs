// src/lib.rs

//! Content ingestion core for disaster-news monitoring

pub mod capabilities;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
