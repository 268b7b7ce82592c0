pub mod batch_run;
pub mod loaders;
pub mod row;

pub use batch_run::{BatchRun, Mode, RunNotice, RunOutcome};
pub use loaders::{load_rows, FileRowExtractor, TabularExtractor};
pub use row::{Item, OutputRecord, RecordOrigin, Row};
