//! Resume processing domain: multipart intake, upload validation, per-file
//! extraction and inference, response aggregation, and usage logging.

pub mod handlers;
pub mod models;
pub mod usage;
pub mod validation;
