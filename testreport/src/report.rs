// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::ParseTestResultError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

/// The root of a test report: the build, test and benchmark results of a collection of packages.
///
/// A `Report` is produced once, at the end of report construction, and is not modified afterwards.
/// Packages are stored in the order they were sealed.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Report {
    packages: Vec<Package>,
}

impl Report {
    /// Creates a new `Report` from packages, in the order they were sealed.
    pub fn new(packages: impl IntoIterator<Item = Package>) -> Self {
        Self {
            packages: packages.into_iter().collect(),
        }
    }

    /// Returns the packages in this report.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Consumes the report, returning its packages.
    pub fn into_packages(self) -> Vec<Package> {
        self.packages
    }

    /// Returns true if no package has a build or run error, and every test either passed or was
    /// skipped.
    ///
    /// Tests that never ended (result [`TestResult::Unknown`]) count as failures.
    pub fn is_successful(&self) -> bool {
        self.packages.iter().all(|package| package.is_successful())
    }

    /// The total number of tests across all packages.
    pub fn test_count(&self) -> usize {
        self.packages.iter().map(|package| package.tests.len()).sum()
    }

    /// The number of tests across all packages whose result is neither pass nor skip.
    pub fn failure_count(&self) -> usize {
        self.packages
            .iter()
            .flat_map(|package| &package.tests)
            .filter(|test| !test.result.is_success())
            .count()
    }
}

/// Build, test and benchmark results for a single package.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct Package {
    /// The name of this package. Unique within a report.
    pub name: String,

    /// The time taken by the package, as reported by its summary.
    #[serde(default, with = "humantime_serde")]
    pub duration: Duration,

    /// Statement coverage as a percentage, if it was reported.
    #[serde(default)]
    pub coverage: Option<f64>,

    /// Output lines that don't belong to any test, benchmark or error.
    #[serde(default)]
    pub output: Vec<String>,

    /// Arbitrary key/value metadata. Keys are unique.
    #[serde(default)]
    pub properties: IndexMap<String, String>,

    /// Tests in the order they were first seen.
    #[serde(default)]
    pub tests: Vec<Test>,

    /// Benchmarks in the order they were received.
    #[serde(default)]
    pub benchmarks: Vec<Benchmark>,

    /// Set if the package failed to build.
    #[serde(default)]
    pub build_error: Option<PackageError>,

    /// Set if the test binary itself failed, independent of any individual test.
    #[serde(default)]
    pub run_error: Option<PackageError>,
}

impl Package {
    /// Creates a new, empty `Package`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the time taken by this package.
    pub fn set_duration(&mut self, duration: Duration) -> &mut Self {
        self.duration = duration;
        self
    }

    /// Stores a key/value property, overwriting any earlier value for the same key.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Returns the value of a property, if set.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|value| value.as_str())
    }

    /// Returns true if this package has neither a build nor a run error, and all of its tests
    /// passed or were skipped.
    pub fn is_successful(&self) -> bool {
        self.build_error.is_none()
            && self.run_error.is_none()
            && self.tests.iter().all(|test| test.result.is_success())
    }
}

/// The result of a single test or benchmark.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum TestResult {
    /// The test hasn't ended, or its result couldn't be determined.
    #[default]
    Unknown,

    /// The test passed.
    Pass,

    /// The test failed.
    Fail,

    /// The test was skipped.
    Skip,
}

impl TestResult {
    /// Returns true if this result counts towards a successful report.
    ///
    /// `Unknown` is never treated as a success.
    pub fn is_success(self) -> bool {
        matches!(self, TestResult::Pass | TestResult::Skip)
    }

    /// Returns the canonical string form of this result.
    pub fn as_str(self) -> &'static str {
        match self {
            TestResult::Unknown => "UNKNOWN",
            TestResult::Pass => "PASS",
            TestResult::Fail => "FAIL",
            TestResult::Skip => "SKIP",
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestResult {
    type Err = ParseTestResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `ok` and `?` come from package summary lines, `BENCH` from benchmark result lines.
        match s {
            "PASS" | "ok" | "BENCH" => Ok(TestResult::Pass),
            "FAIL" => Ok(TestResult::Fail),
            "SKIP" => Ok(TestResult::Skip),
            "" | "?" | "UNKNOWN" => Ok(TestResult::Unknown),
            other => Err(ParseTestResultError::new(other)),
        }
    }
}

/// The results of a single test.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct Test {
    /// The full name of the test, including any parent test names.
    pub name: String,

    /// The time taken by the test.
    #[serde(default, with = "humantime_serde")]
    pub duration: Duration,

    /// The result of the test.
    #[serde(default)]
    pub result: TestResult,

    /// Nesting level: 0 for a top-level test, N for an Nth-level subtest.
    #[serde(default)]
    pub level: usize,

    /// Output lines attributed to exactly this test.
    #[serde(default)]
    pub output: Vec<String>,
}

impl Test {
    /// Creates a new `Test` with an unknown result.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the name of the test this one is nested under, judged by name structure.
    ///
    /// `TestA/sub/deeper` has the parent name `TestA/sub`; `TestA` has none. This is independent
    /// of [`level`](Self::level), which is reported by the test tool.
    pub fn parent_name(&self) -> Option<&str> {
        self.name.rsplit_once('/').map(|(parent, _)| parent)
    }
}

/// The results of a single benchmark.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct Benchmark {
    /// The name of the benchmark.
    pub name: String,

    /// The result of the benchmark.
    #[serde(default)]
    pub result: TestResult,

    /// Output lines attributed to this benchmark.
    #[serde(default)]
    pub output: Vec<String>,

    /// The number of iterations run.
    #[serde(default)]
    pub iterations: u64,

    /// Nanoseconds per operation.
    #[serde(default)]
    pub ns_per_op: f64,

    /// Throughput in megabytes per second.
    #[serde(default)]
    pub mb_per_sec: f64,

    /// Bytes allocated per operation.
    #[serde(default)]
    pub bytes_per_op: u64,

    /// Allocations per operation.
    #[serde(default)]
    pub allocs_per_op: u64,
}

impl Benchmark {
    /// Creates a new `Benchmark` with zeroed metrics.
    pub fn new(name: impl Into<String>, result: TestResult) -> Self {
        Self {
            name: name.into(),
            result,
            ..Default::default()
        }
    }
}

/// Details of a build or run failure of a package.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct PackageError {
    /// The name of the package that failed.
    pub name: String,

    /// The time taken before the failure was reported.
    #[serde(default, with = "humantime_serde")]
    pub duration: Duration,

    /// A short description of what caused the failure, e.g. `[build failed]`.
    #[serde(default)]
    pub cause: Option<String>,

    /// Output lines collected for the failure.
    #[serde(default)]
    pub output: Vec<String>,
}

impl PackageError {
    /// Creates a new `PackageError` for the given package name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
