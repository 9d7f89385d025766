pub mod submission;
pub mod export;

pub use submission::{apply_submission, validate_submission, AvailabilitySubmission, DeclaredCost};
pub use export::{export_plan_to_csv, write_plan_csv};
