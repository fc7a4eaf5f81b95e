use thiserror::Error;

/// Failure reported by a store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] vdna_db::DbError),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Failure delivering a run report.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification API returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Fatal failure of a daily cycle. Only upstream fetches abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch {stage}: {source}")]
    Upstream {
        stage: &'static str,
        #[source]
        source: StoreError,
    },
}

impl PipelineError {
    pub(crate) fn upstream(stage: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Upstream { stage, source }
    }
}
