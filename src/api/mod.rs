//! Analysis backend API: fetch client and report model

pub mod client;
pub mod report;

pub use client::AnalysisClient;
pub use report::{AnalysisReport, Report};
