/// Canonicalize program output before comparison.
///
/// Line terminators become `\n`, trailing whitespace is removed from each line,
/// trailing blank lines are dropped and the whole text is trimmed.
pub fn normalize_output(s: &str) -> String {
    let unified = s.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<&str> = unified.lines().map(str::trim_end).collect();

    // Remove trailing empty lines
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    lines.join("\n").trim().to_string()
}

/// Compare program output with expected output
pub fn compare_output(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}
