#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Invalid CLI/profile input (bad flags, invalid durations, invalid stages, etc.).
    InvalidInput = 30,

    /// Internal/runtime error (IO errors, unexpected invariants).
    RuntimeError = 40,

    /// The run was cancelled (Ctrl-C) before its stages completed.
    Aborted = 50,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_run_state(state: rampr_core::RunState) -> Self {
        match state {
            rampr_core::RunState::Aborted => Self::Aborted,
            _ => Self::Success,
        }
    }
}
