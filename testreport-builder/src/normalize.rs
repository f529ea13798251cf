// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stripping of tool-injected indentation from test output.
//!
//! The Go test tool prefixes lines logged by a test with one 4-space indent per nesting level (plus
//! one for the test itself), to align them under the test's result line. Test authors can also
//! print leading whitespace of their own. The functions here remove only the former.

/// The width of one tool-injected indent unit.
const INDENT: &str = "    ";

/// Removes tool-injected indentation from a line of output produced by a test at `level`.
///
/// If the leading run of spaces is an exact multiple of four, up to `level + 1` 4-space units are
/// removed, stopping early if fewer are present. Otherwise the line is assumed to already be at its
/// intended depth and its spaces are kept. Finally, a single leading tab is removed if present.
///
/// The returned string is always a suffix of `line`. Lines without leading whitespace are returned
/// unchanged.
///
/// ```
/// use testreport_builder::trim_tool_indent;
///
/// assert_eq!(trim_tool_indent("    hello", 0), "hello");
/// assert_eq!(trim_tool_indent("            nested", 1), "    nested");
/// assert_eq!(trim_tool_indent("   odd", 0), "   odd");
/// ```
pub fn trim_tool_indent(line: &str, level: usize) -> &str {
    let prefix_len = line.len() - line.trim_start_matches(' ').len();

    let mut line = line;
    if prefix_len % INDENT.len() == 0 {
        for _ in 0..=level {
            match line.strip_prefix(INDENT) {
                Some(rest) => line = rest,
                None => break,
            }
        }
    }

    line.strip_prefix('\t').unwrap_or(line)
}
