// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test lifecycle events consumed by the report builder.
//!
//! [`RawEvent`] is the open wire form, as produced by a tokenizer of test tool output: a string
//! discriminant plus optional fields. [`Event`] is the closed form the builder dispatches on.

use crate::errors::{EventDecodeError, UnknownEventKind};
use serde::Deserialize;
use std::{io::BufRead, time::Duration};
use testreport::TestResult;
use tracing::debug;

/// Metrics reported for a single benchmark run.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BenchmarkMetrics {
    /// The number of iterations run.
    pub iterations: u64,

    /// Nanoseconds per operation.
    pub ns_per_op: f64,

    /// Throughput in megabytes per second.
    pub mb_per_sec: f64,

    /// Bytes allocated per operation.
    pub bytes_per_op: u64,

    /// Allocations per operation.
    pub allocs_per_op: u64,
}

/// A test lifecycle event.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A test started running (`run_test`).
    RunTest {
        /// The name of the test.
        name: String,
    },

    /// A test was paused, typically because it is parallel (`pause_test`).
    PauseTest {
        /// The name of the test.
        name: String,
    },

    /// A paused test continued running (`cont_test`).
    ContTest {
        /// The name of the test.
        name: String,
    },

    /// A test ended (`end_test`).
    EndTest {
        /// The name of the test.
        name: String,

        /// The result of the test.
        result: TestResult,

        /// The time taken by the test.
        duration: Duration,

        /// The indentation of the result line, i.e. the nesting level of the test.
        indent: usize,
    },

    /// A benchmark produced a result (`benchmark`).
    Benchmark {
        /// The name of the benchmark.
        name: String,

        /// The reported metrics.
        metrics: BenchmarkMetrics,
    },

    /// The overall status line of a test binary was printed (`status`).
    Status,

    /// A package summary line was printed (`summary`).
    Summary {
        /// The name of the package.
        name: String,

        /// The result of the package.
        result: TestResult,

        /// The time taken by the package.
        duration: Duration,

        /// Auxiliary data printed on the summary line, e.g. `[no test files]`.
        data: Option<String>,
    },

    /// Statement coverage was reported (`coverage`).
    Coverage {
        /// Coverage as a percentage.
        percent: f64,

        /// The packages the coverage was measured against.
        packages: Vec<String>,
    },

    /// A package failed to build; output that follows belongs to the build failure
    /// (`build_output`).
    BuildOutput {
        /// The name of the package.
        name: String,
    },

    /// A line of output (`output`).
    Output {
        /// The line, including any trailing newline.
        data: String,
    },
}

impl Event {
    /// Returns the wire discriminant for this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::RunTest { .. } => "run_test",
            Event::PauseTest { .. } => "pause_test",
            Event::ContTest { .. } => "cont_test",
            Event::EndTest { .. } => "end_test",
            Event::Benchmark { .. } => "benchmark",
            Event::Status => "status",
            Event::Summary { .. } => "summary",
            Event::Coverage { .. } => "coverage",
            Event::BuildOutput { .. } => "build_output",
            Event::Output { .. } => "output",
        }
    }
}

/// The wire form of a test lifecycle event.
///
/// Every field except the discriminant is optional; fields that don't apply to an event's kind are
/// ignored when converting to an [`Event`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RawEvent {
    /// The event discriminant, e.g. `run_test`.
    #[serde(rename = "type")]
    pub kind: String,

    /// The test, benchmark or package name.
    #[serde(default)]
    pub name: String,

    /// The result token, e.g. `PASS` or `ok`.
    #[serde(default)]
    pub result: Option<String>,

    /// The duration, as a humantime string such as `1.5s` or `10ms`.
    #[serde(default, with = "humantime_serde")]
    pub duration: Option<Duration>,

    /// The indentation level of the line the event was parsed from.
    #[serde(default)]
    pub indent: Option<usize>,

    /// Benchmark iterations.
    #[serde(default)]
    pub iterations: Option<u64>,

    /// Benchmark nanoseconds per operation.
    #[serde(default)]
    pub ns_per_op: Option<f64>,

    /// Benchmark megabytes per second.
    #[serde(default)]
    pub mb_per_sec: Option<f64>,

    /// Benchmark bytes per operation.
    #[serde(default)]
    pub bytes_per_op: Option<u64>,

    /// Benchmark allocations per operation.
    #[serde(default)]
    pub allocs_per_op: Option<u64>,

    /// Coverage percentage.
    #[serde(default)]
    pub cov_pct: Option<f64>,

    /// Packages a coverage percentage applies to.
    #[serde(default)]
    pub cov_packages: Vec<String>,

    /// Free-form data: the output line for `output` events, auxiliary data for `summary` events.
    #[serde(default)]
    pub data: Option<String>,
}

impl RawEvent {
    /// Creates a new `RawEvent` with the given discriminant and name, and no other fields set.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    fn parse_result(&self) -> TestResult {
        let Some(result) = self.result.as_deref() else {
            return TestResult::Unknown;
        };
        result.parse().unwrap_or_else(|error| {
            debug!(event_name = %self.name, "{error}, treating as unknown");
            TestResult::Unknown
        })
    }
}

impl TryFrom<RawEvent> for Event {
    type Error = UnknownEventKind;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let result = raw.parse_result();
        let duration = raw.duration.unwrap_or_default();

        let event = match raw.kind.as_str() {
            "run_test" => Event::RunTest { name: raw.name },
            "pause_test" => Event::PauseTest { name: raw.name },
            "cont_test" => Event::ContTest { name: raw.name },
            "end_test" => Event::EndTest {
                name: raw.name,
                result,
                duration,
                indent: raw.indent.unwrap_or_default(),
            },
            "benchmark" => Event::Benchmark {
                name: raw.name,
                metrics: BenchmarkMetrics {
                    iterations: raw.iterations.unwrap_or_default(),
                    ns_per_op: raw.ns_per_op.unwrap_or_default(),
                    mb_per_sec: raw.mb_per_sec.unwrap_or_default(),
                    bytes_per_op: raw.bytes_per_op.unwrap_or_default(),
                    allocs_per_op: raw.allocs_per_op.unwrap_or_default(),
                },
            },
            "status" => Event::Status,
            "summary" => Event::Summary {
                name: raw.name,
                result,
                duration,
                data: raw.data.filter(|data| !data.is_empty()),
            },
            "coverage" => Event::Coverage {
                percent: raw.cov_pct.unwrap_or_default(),
                packages: raw.cov_packages,
            },
            "build_output" => Event::BuildOutput { name: raw.name },
            "output" => Event::Output {
                data: raw.data.unwrap_or_default(),
            },
            _ => return Err(UnknownEventKind::new(raw.kind)),
        };
        Ok(event)
    }
}

/// Lazily decodes newline-delimited JSON events from a reader.
///
/// Blank lines are skipped. A line that can't be read or decoded yields an error, and decoding
/// continues with the next line.
pub fn read_events<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<RawEvent, EventDecodeError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line_number = index + 1;
            let line = match line {
                Ok(line) => line,
                Err(error) => return Some(Err(EventDecodeError::Read { line_number, error })),
            };
            if line.trim().is_empty() {
                return None;
            }
            Some(
                serde_json::from_str(&line)
                    .map_err(|error| EventDecodeError::Json { line_number, error }),
            )
        })
}
