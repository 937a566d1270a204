//! Process exit codes.
//!
//! - 0: success
//! - 1: any other failure
//! - 2: invalid configuration or unreadable/malformed input
//! - 3: the batch finished but one or more cases failed

use bias_probe_core::BiasError;

/// Exit code of a `bias-probe` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliExitCode {
    Success = 0,
    Error = 1,
    InvalidInput = 2,
    CasesFailed = 3,
}

impl From<CliExitCode> for i32 {
    fn from(code: CliExitCode) -> Self {
        code as i32
    }
}

/// Pick the exit code for a failed command.
///
/// Looks through the whole context chain for a [`BiasError`]; configuration,
/// I/O and parse failures map to [`CliExitCode::InvalidInput`].
pub fn exit_code_for_error(err: &anyhow::Error) -> CliExitCode {
    let bias = err.chain().find_map(|e| e.downcast_ref::<BiasError>());
    match bias {
        Some(e) if is_input_error(e) => CliExitCode::InvalidInput,
        _ => CliExitCode::Error,
    }
}

fn is_input_error(err: &BiasError) -> bool {
    err.is_configuration() || matches!(err, BiasError::Io { .. } | BiasError::Parse { .. })
}
