// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bookkeeping for the in-flight tests of the package under construction.

use crate::normalize::trim_tool_indent;
use std::{collections::HashMap, time::Duration};
use testreport::{Test, TestResult};
use tracing::debug;

/// Index of a test node within a [`TestTracker`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct TestId(usize);

/// Liveness of a test node.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum TestState {
    Running,
    Paused,
    Ended,
}

#[derive(Debug)]
struct TestNode {
    test: Test,
    state: TestState,
}

/// Tests of the current package, stored in creation order and looked up by name.
///
/// Nodes are never removed: ending a test marks it as such. The name index always points at the
/// most recently created node for a name, so a test that runs again after ending gets a fresh node.
#[derive(Debug, Default)]
pub(crate) struct TestTracker {
    nodes: Vec<TestNode>,
    by_name: HashMap<String, TestId>,
}

impl TestTracker {
    /// Returns the node for `name`, creating it if there isn't one that is still live.
    ///
    /// Creating a live test again resumes it rather than adding a duplicate.
    pub(crate) fn create(&mut self, name: &str) -> TestId {
        if let Some(id) = self.live(name) {
            self.nodes[id.0].state = TestState::Running;
            return id;
        }
        self.insert(name)
    }

    /// Marks a live test as paused. Returns false if there is no live test with this name.
    pub(crate) fn pause(&mut self, name: &str) -> bool {
        match self.live(name) {
            Some(id) => {
                self.nodes[id.0].state = TestState::Paused;
                true
            }
            None => false,
        }
    }

    /// Marks a paused test as running again, returning its node.
    ///
    /// An ended test keeps its state; its node is still returned.
    pub(crate) fn resume(&mut self, name: &str) -> Option<TestId> {
        let id = *self.by_name.get(name)?;
        let node = &mut self.nodes[id.0];
        if node.state == TestState::Paused {
            node.state = TestState::Running;
        }
        Some(id)
    }

    /// Ends a test, recording its terminal fields and normalizing its output for `level`.
    ///
    /// If no live test has this name, one is created with only the terminal fields set.
    pub(crate) fn end(
        &mut self,
        name: &str,
        result: TestResult,
        duration: Duration,
        level: usize,
    ) -> TestId {
        let id = match self.live(name) {
            Some(id) => id,
            None => {
                debug!(test_name = name, "test ended without being started");
                self.insert(name)
            }
        };

        let node = &mut self.nodes[id.0];
        node.state = TestState::Ended;
        node.test.result = result;
        node.test.duration = duration;
        node.test.level = level;
        for line in &mut node.test.output {
            let strip = line.len() - trim_tool_indent(line, level).len();
            line.replace_range(..strip, "");
        }
        id
    }

    /// Appends a line of output to a test that hasn't ended.
    ///
    /// Returns false, dropping the line, if the test has ended.
    pub(crate) fn append_output(&mut self, id: TestId, line: String) -> bool {
        let node = &mut self.nodes[id.0];
        if node.state == TestState::Ended {
            return false;
        }
        node.test.output.push(line);
        true
    }

    pub(crate) fn state(&self, id: TestId) -> TestState {
        self.nodes[id.0].state
    }

    pub(crate) fn name(&self, id: TestId) -> &str {
        &self.nodes[id.0].test.name
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Consumes the tracker, returning tests in creation order.
    ///
    /// Tests that never ended keep an unknown result.
    pub(crate) fn into_tests(self) -> Vec<Test> {
        self.nodes.into_iter().map(|node| node.test).collect()
    }

    fn live(&self, name: &str) -> Option<TestId> {
        self.by_name
            .get(name)
            .copied()
            .filter(|id| self.nodes[id.0].state != TestState::Ended)
    }

    fn insert(&mut self, name: &str) -> TestId {
        let id = TestId(self.nodes.len());
        self.nodes.push(TestNode {
            test: Test::new(name),
            state: TestState::Running,
        });
        self.by_name.insert(name.to_owned(), id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn create_is_idempotent_while_live() {
        let mut tracker = TestTracker::default();
        let first = tracker.create("TestA");
        tracker.pause("TestA");
        let second = tracker.create("TestA");

        assert_eq!(first, second);
        assert_eq!(tracker.state(first), TestState::Running);
        assert_eq!(tracker.into_tests().len(), 1);
    }

    #[test]
    fn create_after_end_adds_node() {
        let mut tracker = TestTracker::default();
        let first = tracker.create("TestA");
        tracker.end("TestA", TestResult::Pass, Duration::ZERO, 0);
        let second = tracker.create("TestA");

        assert_ne!(first, second);
        let tests = tracker.into_tests();
        assert_eq!(tests.len(), 2);
        assert_eq!(tests[0].result, TestResult::Pass);
        assert_eq!(tests[1].result, TestResult::Unknown);
    }

    #[test]
    fn pause_and_resume() {
        let mut tracker = TestTracker::default();
        let id = tracker.create("TestA");

        assert!(tracker.pause("TestA"));
        assert_eq!(tracker.state(id), TestState::Paused);
        assert_eq!(tracker.resume("TestA"), Some(id));
        assert_eq!(tracker.state(id), TestState::Running);
    }

    #[test]
    fn unknown_names_are_tolerated() {
        let mut tracker = TestTracker::default();
        assert!(!tracker.pause("TestMissing"));
        assert_eq!(tracker.resume("TestMissing"), None);
        assert!(tracker.is_empty());
    }

    #[test]
    fn end_without_create_synthesizes_one_test() {
        let mut tracker = TestTracker::default();
        let id = tracker.end("TestA", TestResult::Fail, Duration::from_millis(5), 1);

        assert_eq!(tracker.state(id), TestState::Ended);
        assert_eq!(tracker.name(id), "TestA");
        let tests = tracker.into_tests();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].result, TestResult::Fail);
        assert_eq!(tests[0].duration, Duration::from_millis(5));
        assert_eq!(tests[0].level, 1);
    }

    #[test]
    fn end_normalizes_output_and_rejects_later_lines() {
        let mut tracker = TestTracker::default();
        let id = tracker.create("TestA/sub");
        assert!(tracker.append_output(id, "        logged\n".to_owned()));
        assert!(tracker.append_output(id, "            indented by author\n".to_owned()));
        tracker.end("TestA/sub", TestResult::Pass, Duration::ZERO, 1);

        assert!(!tracker.append_output(id, "late\n".to_owned()));
        let tests = tracker.into_tests();
        assert_eq!(tests[0].output, ["logged\n", "    indented by author\n"]);
    }
}
