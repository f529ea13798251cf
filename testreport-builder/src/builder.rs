// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The report builder state machine.

use crate::{
    assemble::{PackageState, PackageSummary, assemble_package},
    config::BuilderConfig,
    events::BenchmarkMetrics,
    tracker::{TestId, TestState},
};
use indexmap::IndexMap;
use std::{mem, time::Duration};
use testreport::{Benchmark, Package, PackageError, Report, TestResult};
use tracing::{debug, warn};

/// Where the next line of output goes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Cursor {
    /// The current package's unattributed output.
    Package,
    Test(TestId),
    Benchmark(usize),
    /// Index into the pending build errors.
    BuildError(usize),
}

/// Incrementally builds a [`Report`] from test lifecycle operations.
///
/// Each method corresponds to one kind of event, and is applied to the package currently under
/// construction. No operation fails: out-of-order or incomplete sequences are recorded as they are,
/// with missing pieces left unset. Call [`build`](Self::build) at any point to get the report.
///
/// Tests go through `created -> running -> (paused <-> running)* -> ended`; a package is open until
/// its summary seals it. Nothing is reopened once ended or sealed.
#[derive(Debug)]
pub struct ReportBuilder {
    config: BuilderConfig,
    packages: Vec<Package>,
    current: PackageState,
    /// Build errors by package name, in the order first seen, until a summary claims them.
    build_errors: IndexMap<String, PackageError>,
    cursor: Cursor,
}

impl ReportBuilder {
    /// Creates a new, empty `ReportBuilder`.
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            packages: Vec::new(),
            current: PackageState::default(),
            build_errors: IndexMap::new(),
            cursor: Cursor::Package,
        }
    }

    /// Starts a test, or resumes it if a test with this name is still running or paused.
    ///
    /// Output that follows belongs to this test.
    pub fn create_test(&mut self, name: &str) {
        let id = self.current.tests.create(name);
        self.cursor = Cursor::Test(id);
    }

    /// Pauses a test. If output was going to this test, output that follows belongs to the package
    /// until a test continues.
    pub fn pause_test(&mut self, name: &str) {
        if !self.current.tests.pause(name) {
            debug!(test_name = name, "pause for unknown test ignored");
        }
        if let Cursor::Test(id) = self.cursor
            && self.current.tests.name(id) == name
        {
            self.cursor = Cursor::Package;
        }
    }

    /// Continues a paused test. Output that follows belongs to this test.
    pub fn continue_test(&mut self, name: &str) {
        match self.current.tests.resume(name) {
            Some(id) => {
                if self.current.tests.state(id) == TestState::Ended {
                    debug!(test_name = name, "continue for a test that already ended");
                }
                self.cursor = Cursor::Test(id);
            }
            None => {
                debug!(test_name = name, "continue for unknown test ignored");
                self.cursor = Cursor::Package;
            }
        }
    }

    /// Ends a test with its result, duration and nesting level.
    ///
    /// Output already collected for the test is stripped of tool-injected indentation for `level`.
    /// A test that was never started is created here.
    pub fn end_test(&mut self, name: &str, result: TestResult, duration: Duration, level: usize) {
        self.current.tests.end(name, result, duration, level);
        self.cursor = Cursor::Package;
    }

    /// Records a benchmark result. Output that follows belongs to this benchmark.
    pub fn benchmark(&mut self, name: &str, metrics: BenchmarkMetrics) {
        let mut benchmark = Benchmark::new(name, TestResult::Pass);
        benchmark.iterations = metrics.iterations;
        benchmark.ns_per_op = metrics.ns_per_op;
        benchmark.mb_per_sec = metrics.mb_per_sec;
        benchmark.bytes_per_op = metrics.bytes_per_op;
        benchmark.allocs_per_op = metrics.allocs_per_op;

        self.cursor = Cursor::Benchmark(self.current.benchmarks.len());
        self.current.benchmarks.push(benchmark);
    }

    /// Seals the package under construction with the given summary.
    ///
    /// A pending build error for `name` is attached to the package. `data`, if present, is stored
    /// as the [`SUMMARY_PROPERTY`](crate::SUMMARY_PROPERTY) property. If nothing was recorded
    /// since the last package was sealed with the same name, that package's duration is updated
    /// instead of adding a duplicate.
    pub fn create_package(
        &mut self,
        name: &str,
        result: TestResult,
        duration: Duration,
        data: Option<String>,
    ) {
        self.cursor = Cursor::Package;
        let build_error = self.build_errors.shift_remove(name);

        if build_error.is_none()
            && self.current.is_empty()
            && let Some(last) = self.packages.last_mut()
            && last.name == name
        {
            debug!(package_name = name, "package already sealed, updating summary");
            last.duration = duration;
            if let Some(data) = data {
                last.set_property(crate::SUMMARY_PROPERTY, data);
            }
            return;
        }

        let state = mem::take(&mut self.current);
        let summary = PackageSummary {
            name: name.to_owned(),
            result,
            duration,
            data,
        };
        self.packages.push(assemble_package(
            state,
            summary,
            build_error,
            self.config.subtest_mode,
        ));
    }

    /// Records statement coverage for the package under construction.
    ///
    /// Packages in `packages` other than the one sealed are recorded in the
    /// [`COVERAGE_PACKAGES_PROPERTY`](crate::COVERAGE_PACKAGES_PROPERTY) property.
    pub fn coverage(&mut self, percent: f64, packages: Vec<String>) {
        self.current.coverage = Some(percent);
        self.current.coverage_packages = packages;
    }

    /// Records a build error for a package, replacing any earlier one with the same name.
    ///
    /// Unattributed output collected so far moves to the error, as does output that follows.
    pub fn create_build_error(&mut self, name: &str) {
        let mut error = PackageError::new(name);
        error.output = mem::take(&mut self.current.output);
        let (index, _) = self.build_errors.insert_full(name.to_owned(), error);
        self.cursor = Cursor::BuildError(index);
    }

    /// Appends a line of output to whatever currently owns output.
    ///
    /// That is the running test, the last benchmark, or the build error most recently started,
    /// and otherwise the package under construction. Output for a test that already ended is
    /// dropped.
    pub fn append_output(&mut self, line: impl Into<String>) {
        let line = line.into();
        match self.cursor {
            Cursor::Package => self.current.output.push(line),
            Cursor::Test(id) => {
                if !self.current.tests.append_output(id, line) {
                    warn!(
                        test_name = self.current.tests.name(id),
                        "output received after test ended, ignoring"
                    );
                }
            }
            Cursor::Benchmark(index) => match self.current.benchmarks.get_mut(index) {
                Some(benchmark) => benchmark.output.push(line),
                None => self.current.output.push(line),
            },
            Cursor::BuildError(index) => match self.build_errors.get_index_mut(index) {
                Some((_, error)) => error.output.push(line),
                None => self.current.output.push(line),
            },
        }
    }

    /// Marks the end of a test binary's output. Output that follows belongs to the package.
    ///
    /// The package itself stays open until its summary.
    pub fn end(&mut self) {
        self.cursor = Cursor::Package;
    }

    /// Seals anything still open and returns the finished report.
    ///
    /// Recorded state that never received a summary becomes a package named after
    /// [`BuilderConfig::package_name`]. Build errors no summary claimed become packages of their
    /// own, in the order they were first seen.
    pub fn build(mut self) -> Report {
        if !self.current.is_empty() {
            let name = self.config.package_name.clone();
            self.create_package(&name, TestResult::Unknown, Duration::ZERO, None);
        }

        while let Some((name, error)) = self.build_errors.first() {
            let (name, duration) = (name.clone(), error.duration);
            self.create_package(&name, TestResult::Fail, duration, None);
        }

        Report::new(self.packages)
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{COVERAGE_PACKAGES_PROPERTY, SUMMARY_PROPERTY};
    use pretty_assertions::assert_eq;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn single_passing_test() {
        let mut builder = ReportBuilder::default();
        builder.create_test("TestA");
        builder.append_output("    hello\n");
        builder.end_test("TestA", TestResult::Pass, MS, 0);
        builder.end();
        builder.create_package("pkg", TestResult::Pass, MS, None);

        let report = builder.build();
        assert!(report.is_successful());
        let [package] = report.packages() else {
            panic!("expected one package");
        };
        assert_eq!(package.name, "pkg");
        assert_eq!(package.tests.len(), 1);
        assert_eq!(package.tests[0].name, "TestA");
        assert_eq!(package.tests[0].result, TestResult::Pass);
        assert_eq!(package.tests[0].output, ["hello\n"]);
    }

    #[test]
    fn build_error_collects_following_output() {
        let mut builder = ReportBuilder::default();
        builder.create_build_error("pkg");
        builder.append_output("undefined: Foo\n");
        builder.end();

        let report = builder.build();
        assert!(!report.is_successful());
        let [package] = report.packages() else {
            panic!("expected one package");
        };
        assert_eq!(package.name, "pkg");
        assert!(package.tests.is_empty());
        let build_error = package.build_error.as_ref().expect("build error recorded");
        assert_eq!(build_error.output, ["undefined: Foo\n"]);
        assert!(package.output.is_empty());
    }

    #[test]
    fn build_error_claimed_by_summary() {
        let mut builder = ReportBuilder::default();
        builder.create_build_error("pkg/a");
        builder.append_output("a.go:1: undefined: Foo\n");
        builder.create_build_error("pkg/b");
        builder.append_output("b.go:1: undefined: Bar\n");
        builder.end();
        builder.create_package("pkg/b", TestResult::Fail, MS, Some("[build failed]".to_owned()));

        let report = builder.build();
        let names: Vec<_> = report.packages().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["pkg/b", "pkg/a"]);

        let b = &report.packages()[0];
        let error = b.build_error.as_ref().unwrap();
        assert_eq!(error.cause.as_deref(), Some("[build failed]"));
        assert_eq!(error.output, ["b.go:1: undefined: Bar\n"]);
        assert_eq!(
            report.packages()[1].build_error.as_ref().unwrap().output,
            ["a.go:1: undefined: Foo\n"]
        );
    }

    #[test]
    fn build_error_overwrites_same_name() {
        let mut builder = ReportBuilder::default();
        builder.create_build_error("pkg");
        builder.append_output("first\n");
        builder.create_build_error("pkg");
        builder.append_output("second\n");

        let report = builder.build();
        assert_eq!(report.packages().len(), 1);
        assert_eq!(
            report.packages()[0].build_error.as_ref().unwrap().output,
            ["second\n"]
        );
    }

    #[test]
    fn build_error_takes_earlier_package_output() {
        let mut builder = ReportBuilder::default();
        builder.append_output("# pkg\n");
        builder.create_build_error("pkg");
        builder.append_output("undefined: Foo\n");

        let report = builder.build();
        let [package] = report.packages() else {
            panic!("expected one package");
        };
        assert_eq!(
            package.build_error.as_ref().unwrap().output,
            ["# pkg\n", "undefined: Foo\n"]
        );
    }

    #[test]
    fn build_error_and_tests_coexist() {
        let mut builder = ReportBuilder::default();
        builder.create_build_error("pkg");
        builder.create_test("TestA");
        builder.end_test("TestA", TestResult::Pass, MS, 0);
        builder.create_package("pkg", TestResult::Fail, MS, None);

        let report = builder.build();
        let [package] = report.packages() else {
            panic!("expected one package");
        };
        assert!(package.build_error.is_some());
        assert_eq!(package.tests.len(), 1);
        assert!(!report.is_successful());
    }

    #[test]
    fn pausing_another_test_keeps_output_routing() {
        let mut builder = ReportBuilder::default();
        builder.create_test("TestA");
        builder.create_test("TestB");
        builder.pause_test("TestA");
        builder.append_output("    b still running\n");
        builder.end_test("TestB", TestResult::Pass, MS, 0);
        builder.create_package("pkg", TestResult::Pass, MS, None);

        let report = builder.build();
        let package = &report.packages()[0];
        assert_eq!(package.tests[1].name, "TestB");
        assert_eq!(package.tests[1].output, ["b still running\n"]);
        assert!(package.tests[0].output.is_empty());
        assert!(package.output.is_empty());
    }

    #[test]
    fn paused_parallel_tests_keep_their_output() {
        let mut builder = ReportBuilder::default();
        builder.create_test("TestA");
        builder.pause_test("TestA");
        builder.create_test("TestB");
        builder.pause_test("TestB");
        builder.append_output("between tests\n");
        builder.continue_test("TestA");
        builder.append_output("    a says hi\n");
        builder.continue_test("TestB");
        builder.append_output("    b says hi\n");
        builder.end_test("TestB", TestResult::Pass, MS, 0);
        builder.end_test("TestA", TestResult::Fail, MS, 0);
        builder.create_package("pkg", TestResult::Fail, MS, None);

        let report = builder.build();
        let package = &report.packages()[0];
        let tests: Vec<_> = package
            .tests
            .iter()
            .map(|test| (test.name.as_str(), test.result, test.output.clone()))
            .collect();
        assert_eq!(
            tests,
            [
                ("TestA", TestResult::Fail, vec!["a says hi\n".to_owned()]),
                ("TestB", TestResult::Pass, vec!["b says hi\n".to_owned()]),
            ]
        );
        assert_eq!(package.output, ["between tests\n"]);
        assert_eq!(package.run_error, None);
    }

    #[test]
    fn nested_subtest_output_is_trimmed_by_level() {
        let mut builder = ReportBuilder::default();
        builder.create_test("TestA");
        builder.create_test("TestA/sub");
        builder.append_output("        sub log\n");
        builder.append_output("            author indent\n");
        builder.end_test("TestA/sub", TestResult::Pass, MS, 1);
        builder.end_test("TestA", TestResult::Pass, MS, 0);
        builder.create_package("pkg", TestResult::Pass, MS, None);

        let report = builder.build();
        let sub = &report.packages()[0].tests[1];
        assert_eq!(sub.name, "TestA/sub");
        assert_eq!(sub.level, 1);
        assert_eq!(sub.output, ["sub log\n", "    author indent\n"]);
    }

    #[test]
    fn end_without_create_yields_one_test() {
        let mut builder = ReportBuilder::default();
        builder.end_test("TestA", TestResult::Pass, MS, 0);
        builder.create_package("pkg", TestResult::Pass, MS, None);

        let report = builder.build();
        assert_eq!(report.test_count(), 1);
        assert_eq!(report.packages()[0].tests[0].result, TestResult::Pass);
    }

    #[test]
    fn output_after_end_goes_to_package() {
        let mut builder = ReportBuilder::default();
        builder.create_test("TestA");
        builder.end_test("TestA", TestResult::Pass, MS, 0);
        builder.append_output("PASS\n");
        builder.create_package("pkg", TestResult::Pass, MS, None);

        let report = builder.build();
        let package = &report.packages()[0];
        assert!(package.tests[0].output.is_empty());
        assert_eq!(package.output, ["PASS\n"]);
    }

    #[test]
    fn output_for_continued_ended_test_is_dropped() {
        let mut builder = ReportBuilder::default();
        builder.create_test("TestA");
        builder.end_test("TestA", TestResult::Pass, MS, 0);
        builder.continue_test("TestA");
        builder.append_output("late\n");
        builder.create_package("pkg", TestResult::Pass, MS, None);

        let report = builder.build();
        let package = &report.packages()[0];
        assert!(package.tests[0].output.is_empty());
        assert!(package.output.is_empty());
    }

    #[test]
    fn unended_test_stays_unknown() {
        let mut builder = ReportBuilder::new(BuilderConfig::new("fallback"));
        builder.create_test("TestCrash");
        builder.append_output("panic: boom\n");

        let report = builder.build();
        let [package] = report.packages() else {
            panic!("expected one package");
        };
        assert_eq!(package.name, "fallback");
        assert_eq!(package.tests[0].result, TestResult::Unknown);
        assert_eq!(package.tests[0].output, ["panic: boom\n"]);
        assert!(!report.is_successful());
    }

    #[test]
    fn sealing_twice_yields_one_package() {
        let mut builder = ReportBuilder::default();
        builder.create_test("TestA");
        builder.end_test("TestA", TestResult::Pass, MS, 0);
        builder.end();
        builder.create_package("pkg", TestResult::Pass, MS, None);
        builder.end();
        builder.create_package("pkg", TestResult::Pass, 2 * MS, Some("[cached]".to_owned()));

        let report = builder.build();
        let [package] = report.packages() else {
            panic!("expected one package");
        };
        assert_eq!(package.duration, 2 * MS);
        assert_eq!(package.tests.len(), 1);
        assert_eq!(package.property(SUMMARY_PROPERTY), Some("[cached]"));
    }

    #[test]
    fn benchmarks_and_their_output() {
        let mut builder = ReportBuilder::default();
        builder.benchmark(
            "BenchmarkFoo",
            BenchmarkMetrics {
                iterations: 1000,
                ns_per_op: 12.5,
                mb_per_sec: 0.0,
                bytes_per_op: 16,
                allocs_per_op: 1,
            },
        );
        builder.append_output("    bench_test.go:10: log\n");
        builder.benchmark("BenchmarkBar", BenchmarkMetrics::default());
        builder.create_package("pkg", TestResult::Pass, MS, None);

        let report = builder.build();
        let benchmarks = &report.packages()[0].benchmarks;
        assert_eq!(benchmarks.len(), 2);
        assert_eq!(benchmarks[0].name, "BenchmarkFoo");
        assert_eq!(benchmarks[0].result, TestResult::Pass);
        assert_eq!(benchmarks[0].iterations, 1000);
        assert_eq!(benchmarks[0].ns_per_op, 12.5);
        assert_eq!(benchmarks[0].output, ["    bench_test.go:10: log\n"]);
        assert_eq!(benchmarks[1].name, "BenchmarkBar");
        assert!(benchmarks[1].output.is_empty());
    }

    #[test]
    fn coverage_is_attached_at_seal() {
        let mut builder = ReportBuilder::default();
        builder.coverage(42.0, vec!["pkg".to_owned(), "pkg/internal".to_owned()]);
        builder.create_package("pkg", TestResult::Pass, MS, None);
        builder.create_package("next", TestResult::Pass, MS, None);

        let report = builder.build();
        let [pkg, next] = report.packages() else {
            panic!("expected two packages");
        };
        assert_eq!(pkg.coverage, Some(42.0));
        assert_eq!(pkg.property(COVERAGE_PACKAGES_PROPERTY), Some("pkg/internal"));
        assert_eq!(next.coverage, None);
    }

    #[test]
    fn packages_in_seal_order() {
        let mut builder = ReportBuilder::default();
        for name in ["c", "a", "b"] {
            builder.create_test("TestX");
            builder.end_test("TestX", TestResult::Pass, MS, 0);
            builder.create_package(name, TestResult::Pass, MS, None);
        }

        let report = builder.build();
        let names: Vec<_> = report.packages().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
        assert_eq!(report.test_count(), 3);
    }
}
