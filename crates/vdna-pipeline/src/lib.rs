//! Daily viral cycle for VDNA.
//!
//! Reads scored trending videos, computes keyword heuristics, selects a
//! bounded short-form and long-form track, drops sources that already became
//! production work, and fans the rest out to every autopilot organization
//! with atomic credit charging. Each run ends in a [`RunReport`].

pub mod dedup;
pub mod error;
pub mod fanout;
pub mod notify;
pub mod pipeline;
pub mod report;
pub mod schedule;
pub mod scorer;
pub mod selection;
pub mod store;
pub mod types;

pub use error::{NotifyError, PipelineError, StoreError};
pub use fanout::{process_pairing, PairingContext};
pub use notify::{notifier_from_config, EmailNotifier, NoopNotifier, RunNotifier};
pub use pipeline::{run_daily_cycle, CycleCollaborators};
pub use report::{OrganizationTally, RunReport};
pub use scorer::ViralHeuristics;
pub use selection::{select_tracks, TrackSelection};
pub use store::{CandidateSource, DedupStore, JobSink, OrganizationStore, PgPipelineStore};
pub use types::{
    CreativeIdentity, PairingOutcome, ProductionOrder, ProductionOutcome, ScheduledPost,
    ScoredCandidate, SkipReason,
};
