//! Log assertions for E2E tests

use code_refresh::logging::MemorySink;

/// Lines logged at ERROR
pub fn error_lines(sink: &MemorySink) -> Vec<String> {
    level_lines(sink, "ERROR")
}

/// Lines logged at `level`
pub fn level_lines(sink: &MemorySink, level: &str) -> Vec<String> {
    sink.lines()
        .into_iter()
        .filter(|l| l.split(' ').nth(1) == Some(level))
        .collect()
}

/// Assert that `needles` appear in the log in this order
pub fn assert_log_order(sink: &MemorySink, needles: &[&str]) {
    let lines = sink.lines();
    let mut from = 0;
    for needle in needles {
        match lines[from..].iter().position(|l| l.contains(needle)) {
            Some(i) => from += i + 1,
            None => panic!("{needle:?} not found in order in log:\n{}", lines.join("\n")),
        }
    }
}

/// Assert the run is bracketed by begin and end lines
pub fn assert_bracketed(sink: &MemorySink) {
    let lines = sink.lines();
    assert!(
        lines.first().is_some_and(|l| l.ends_with("INFO ----- Begin -----")),
        "first line is not the begin marker: {lines:?}"
    );
    assert!(
        lines.last().is_some_and(|l| l.ends_with("INFO ----- End -----")),
        "last line is not the end marker: {lines:?}"
    );
}
