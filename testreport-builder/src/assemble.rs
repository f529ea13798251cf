// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns the in-progress state of a package into a sealed [`Package`].

use crate::{
    COVERAGE_PACKAGES_PROPERTY, SUMMARY_PROPERTY, config::SubtestMode, tracker::TestTracker,
};
use std::{collections::HashSet, mem, time::Duration};
use testreport::{Benchmark, Package, PackageError, Test, TestResult};

/// Everything accumulated for the package currently under construction.
#[derive(Debug, Default)]
pub(crate) struct PackageState {
    pub(crate) tests: TestTracker,
    pub(crate) benchmarks: Vec<Benchmark>,
    pub(crate) output: Vec<String>,
    pub(crate) coverage: Option<f64>,
    pub(crate) coverage_packages: Vec<String>,
}

impl PackageState {
    /// Returns true if nothing has been recorded for this package.
    pub(crate) fn is_empty(&self) -> bool {
        self.tests.is_empty()
            && self.benchmarks.is_empty()
            && self.output.is_empty()
            && self.coverage.is_none()
            && self.coverage_packages.is_empty()
    }
}

/// The fields of a package summary event.
#[derive(Clone, Debug)]
pub(crate) struct PackageSummary {
    pub(crate) name: String,
    pub(crate) result: TestResult,
    pub(crate) duration: Duration,
    pub(crate) data: Option<String>,
}

/// Seals a package from its accumulated state and summary.
///
/// A claimed build error takes the summary's duration and data. Without one, a failing summary with
/// no failing test is recorded as a run error that takes the package's unattributed output.
pub(crate) fn assemble_package(
    state: PackageState,
    summary: PackageSummary,
    build_error: Option<PackageError>,
    subtest_mode: SubtestMode,
) -> Package {
    let PackageState {
        tests,
        benchmarks,
        mut output,
        coverage,
        coverage_packages,
    } = state;

    let mut package = Package::new(summary.name);
    package.duration = summary.duration;
    package.coverage = coverage;
    package.benchmarks = benchmarks;
    let tests = tests.into_tests();
    // Run errors are judged on recorded results, before the subtest mode rewrites parents.
    let has_failure = tests.iter().any(|test| test.result == TestResult::Fail);
    package.tests = apply_subtest_mode(tests, subtest_mode, &mut output);

    if let Some(data) = &summary.data {
        package.set_property(SUMMARY_PROPERTY, data.clone());
    }
    let other_packages: Vec<&str> = coverage_packages
        .iter()
        .map(|name| name.as_str())
        .filter(|name| *name != package.name)
        .collect();
    if !other_packages.is_empty() {
        package.set_property(COVERAGE_PACKAGES_PROPERTY, other_packages.join(","));
    }

    if let Some(mut error) = build_error {
        error.duration = summary.duration;
        if summary.data.is_some() {
            error.cause = summary.data;
        }
        package.build_error = Some(error);
    } else if summary.result == TestResult::Fail && !has_failure {
        let mut error = PackageError::new(package.name.clone());
        error.duration = summary.duration;
        error.cause = summary.data;
        error.output = mem::take(&mut output);
        package.run_error = Some(error);
    }

    package.output = output;
    package
}

fn apply_subtest_mode(tests: Vec<Test>, mode: SubtestMode, output: &mut Vec<String>) -> Vec<Test> {
    if mode == SubtestMode::IncludeParents {
        return tests;
    }

    let parents: HashSet<String> = tests
        .iter()
        .filter_map(|test| test.parent_name())
        .map(|name| name.to_owned())
        .collect();

    match mode {
        SubtestMode::IncludeParents => tests,
        SubtestMode::IgnoreParentResults => tests
            .into_iter()
            .map(|mut test| {
                if parents.contains(&test.name) {
                    test.result = TestResult::Pass;
                }
                test
            })
            .collect(),
        SubtestMode::ExcludeParents => {
            let mut kept = Vec::with_capacity(tests.len());
            for test in tests {
                if parents.contains(&test.name) {
                    output.extend(test.output);
                } else {
                    kept.push(test);
                }
            }
            kept
        }
    }
}
