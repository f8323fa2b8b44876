pub mod error;
pub mod events;
pub mod ledger;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod submit;
pub mod testutil;
pub mod traits;

pub use error::AppError;
pub use events::{PipelineEvent, PipelineReporter, TracingReporter};
pub use ledger::{JsonFileLedger, MemoryLedger};
pub use models::{
    ApplicantProfile, Posting, RunSummary, SearchFilter, SessionCredential,
};
pub use pipeline::{Pipeline, PipelineConfig};
pub use traits::{ApplicationApi, Ledger, SearchApi};
