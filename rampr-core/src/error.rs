pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`stages` must be a non-empty array of {{ duration, target }}")]
    EmptyStages,

    #[error("invalid stage `{0}` (expected <duration>:<target>, e.g. 30s:100)")]
    InvalidStage(String),

    #[error("invalid duration `{input}`: {reason}")]
    InvalidDuration { input: String, reason: String },

    #[error("stage target must be a non-negative integer (got {0})")]
    NegativeTarget(i64),

    #[error("stages must add up to a positive total duration")]
    ZeroTotalDuration,

    #[error("`max_vus` must be a positive integer")]
    InvalidMaxVus,

    #[error("control `tick` must be a positive duration")]
    InvalidTick,

    #[error("run already finished with state `{0}`")]
    AlreadyFinished(crate::runner::RunState),
}

impl Error {
    /// Configuration errors prevent a run from starting; everything else is a runtime fault.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EmptyStages
                | Self::InvalidStage(_)
                | Self::InvalidDuration { .. }
                | Self::NegativeTarget(_)
                | Self::ZeroTotalDuration
                | Self::InvalidMaxVus
                | Self::InvalidTick
        )
    }
}
