//! Test case loading
//!
//! Test cases live in one directory, numbered `1..=count` with a zero-padded index:
//! - paired layout (direct comparison): `test{i}.in` and `test{i}.out`
//! - input-only layout (checker mode): `{i}.in`

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::JudgeError;

/// A single test case held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub input: String,
    /// Present only when outputs are compared directly
    pub expected_output: Option<String>,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: Some(expected_output.into()),
        }
    }

    pub fn input_only(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: None,
        }
    }
}

/// File naming scheme of a test case directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestcaseLayout {
    Paired,
    InputOnly,
}

impl TestcaseLayout {
    pub fn input_path(&self, dir: &Path, name: &str) -> PathBuf {
        match self {
            TestcaseLayout::Paired => dir.join(format!("test{}.in", name)),
            TestcaseLayout::InputOnly => dir.join(format!("{}.in", name)),
        }
    }

    pub fn output_path(&self, dir: &Path, name: &str) -> Option<PathBuf> {
        match self {
            TestcaseLayout::Paired => Some(dir.join(format!("test{}.out", name))),
            TestcaseLayout::InputOnly => None,
        }
    }
}

/// Number of digits of `count`, the default index width
pub fn default_width(count: usize) -> usize {
    count.to_string().len()
}

/// Zero-padded index; never truncated when `width` is too small
pub fn index_name(index: usize, width: usize) -> String {
    format!("{:0width$}", index, width = width)
}

/// Load `count` test cases from `dir`.
///
/// Fails as a whole if any file is missing or unreadable.
pub async fn load_testcases(
    dir: impl AsRef<Path>,
    count: usize,
    width: Option<usize>,
    layout: TestcaseLayout,
) -> Result<Vec<TestCase>, JudgeError> {
    if count == 0 {
        return Err(JudgeError::InvalidTestcaseCount);
    }
    let dir = dir.as_ref();
    let width = width.unwrap_or_else(|| default_width(count));

    let mut testcases = Vec::with_capacity(count);
    for index in 1..=count {
        let name = index_name(index, width);

        let input = read_testcase_file(&layout.input_path(dir, &name)).await?;
        let expected_output = match layout.output_path(dir, &name) {
            Some(path) => Some(read_testcase_file(&path).await?),
            None => None,
        };

        debug!("Loaded TC #{} from {:?} ({} bytes of input)", index, dir, input.len());
        testcases.push(TestCase {
            input,
            expected_output,
        });
    }

    Ok(testcases)
}

async fn read_testcase_file(path: &Path) -> Result<String, JudgeError> {
    fs::read_to_string(path)
        .await
        .map_err(|source| JudgeError::MissingTestcase {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_paired(dir: &Path, name: &str, input: &str, output: &str) {
        std::fs::write(dir.join(format!("test{}.in", name)), input).unwrap();
        std::fs::write(dir.join(format!("test{}.out", name)), output).unwrap();
    }

    #[test]
    fn test_index_name() {
        assert_eq!(index_name(1, 1), "1");
        assert_eq!(index_name(7, 3), "007");
        assert_eq!(index_name(123, 2), "123");
        assert_eq!(default_width(3), 1);
        assert_eq!(default_width(10), 2);
    }

    #[tokio::test]
    async fn test_load_paired_default_width() {
        let dir = TempDir::new().unwrap();
        for i in 1..=3 {
            write_paired(dir.path(), &i.to_string(), &format!("in{}", i), &format!("out{}", i));
        }

        let cases = load_testcases(dir.path(), 3, None, TestcaseLayout::Paired)
            .await
            .unwrap();

        assert_eq!(cases.len(), 3);
        assert_eq!(cases[0], TestCase::new("in1", "out1"));
        assert_eq!(cases[2], TestCase::new("in3", "out3"));
    }

    #[tokio::test]
    async fn test_load_paired_explicit_width() {
        let dir = TempDir::new().unwrap();
        write_paired(dir.path(), "001", "a", "b");
        write_paired(dir.path(), "002", "c", "d");

        let cases = load_testcases(dir.path(), 2, Some(3), TestcaseLayout::Paired)
            .await
            .unwrap();

        assert_eq!(cases[1], TestCase::new("c", "d"));
    }

    #[tokio::test]
    async fn test_load_input_only() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("1.in"), "5\n").unwrap();
        std::fs::write(dir.path().join("2.in"), "6\n").unwrap();

        let cases = load_testcases(dir.path(), 2, None, TestcaseLayout::InputOnly)
            .await
            .unwrap();

        assert_eq!(cases, vec![TestCase::input_only("5\n"), TestCase::input_only("6\n")]);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        write_paired(dir.path(), "1", "a", "b");
        write_paired(dir.path(), "2", "a", "b");
        // Expected output of the third case is missing
        std::fs::write(dir.path().join("test3.in"), "a").unwrap();

        let err = load_testcases(dir.path(), 3, None, TestcaseLayout::Paired)
            .await
            .unwrap_err();

        match err {
            JudgeError::MissingTestcase { path, .. } => {
                assert_eq!(path, dir.path().join("test3.out"))
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_load_zero_count_fails() {
        let dir = TempDir::new().unwrap();
        let err = load_testcases(dir.path(), 0, None, TestcaseLayout::Paired)
            .await
            .unwrap_err();
        assert!(matches!(err, JudgeError::InvalidTestcaseCount));
    }
}
