pub mod config;
pub mod deletion;
pub mod engine;
pub mod error;
pub mod extract;
pub mod grouping;
pub mod load_cache;
pub mod model;
pub mod progress;
pub mod protocol;
pub mod retention;
pub mod similarity;

pub use config::AppConfig;
pub use engine::{BatchOutcome, CompareEngine};
pub use error::{Error, ExtractionError};
pub use grouping::{Classification, Group, GroupMember};
pub use model::{ComparisonRequest, DocumentKind, FileRepresentation, SimilarityResult};
pub use progress::{ProgressReporter, SilentReporter};
pub use retention::RetentionDecision;
