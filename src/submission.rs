//! Submission under judgement

use std::path::Path;

use crate::error::JudgeError;
use crate::runner::CommandSpec;

/// Interpreter used for script submissions when none is configured
pub const DEFAULT_INTERPRETER: &str = "python3";

/// A runnable command, started fresh for every test case
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    command: CommandSpec,
}

impl Submission {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }

    /// `interpreter <path>`; the script must exist
    pub fn script(interpreter: &str, path: impl AsRef<Path>) -> Result<Self, JudgeError> {
        Ok(Self::new(script_command("submission", interpreter, path.as_ref())?))
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }
}

/// Build `interpreter <path>` after checking that `path` exists
pub(crate) fn script_command(
    what: &'static str,
    interpreter: &str,
    path: &Path,
) -> Result<CommandSpec, JudgeError> {
    if interpreter.is_empty() {
        return Err(JudgeError::EmptyCommand);
    }
    if !path.exists() {
        return Err(JudgeError::MissingPath {
            what,
            path: path.to_path_buf(),
        });
    }
    Ok(CommandSpec::new(interpreter).with_arg(path.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_script_submission() {
        let script = NamedTempFile::new().unwrap();
        let submission = Submission::script("python3", script.path()).unwrap();

        assert_eq!(submission.command().program, "python3");
        assert_eq!(
            submission.command().args,
            vec![script.path().to_string_lossy().to_string()]
        );
    }

    #[test]
    fn test_empty_interpreter_is_rejected() {
        let script = NamedTempFile::new().unwrap();
        assert!(matches!(
            Submission::script("", script.path()),
            Err(JudgeError::EmptyCommand)
        ));
    }

    #[test]
    fn test_missing_script_fails_fast() {
        let err = Submission::script("python3", "/nonexistent/solution.py").unwrap_err();
        assert!(matches!(
            err,
            JudgeError::MissingPath {
                what: "submission",
                ..
            }
        ));
    }
}
