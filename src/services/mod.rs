pub mod artifact_writer;
pub mod fallback;
pub mod notice_writer;
pub mod progress;
pub mod validation;

pub use artifact_writer::{ArtifactWriter, JsonWorkbookWriter, Sheet};
pub use fallback::FallbackSwitch;
pub use notice_writer::NoticeWriter;
pub use progress::{ProgressEvent, ProgressTracker};
pub use validation::validate_rows;
