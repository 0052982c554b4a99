pub mod artifact_writer;
pub mod metrics_service;
pub mod normalization;
pub mod response_extractor;
pub mod sample_loader;

pub use artifact_writer::write_json;
pub use metrics_service::compute_metrics;
pub use normalization::normalize_human_grades;
pub use response_extractor::extract_record;
pub use sample_loader::prepare_samples;
