pub mod grade_map;
pub mod grading;
pub mod metrics;
pub mod prompt;
pub mod sample;

pub use grade_map::GradeMap;
pub use grading::{ExtractedRecord, GradingBatch, GradingItem, GradingResult};
pub use metrics::{DimensionMetrics, HumanScores, Metrics, OverallMetrics};
pub use prompt::{PromptTemplate, CODE_PLACEHOLDER};
pub use sample::{HumanRow, Sample};
