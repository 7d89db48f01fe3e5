// src/edgar/mod.rs
pub mod client;
pub mod models;

pub use client::{DocumentFetcher, EdgarClient};
pub use models::{CompanyInfo, FilingRef, FormType};
