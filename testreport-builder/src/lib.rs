// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Builds a hierarchical [`Report`](testreport::Report) from an ordered stream of test lifecycle
//! events.
//!
//! Events are consumed one at a time by a [`ReportBuilder`]. The builder tracks in-flight tests
//! (including subtests whose output is interleaved through pause and continue events), routes
//! output lines to the test, benchmark or build error that owns them, and seals packages as their
//! summaries arrive. Malformed or truncated event streams are never rejected: the report reflects
//! exactly what the events describe.
//!
//! ```
//! use testreport::TestResult;
//! use testreport_builder::{BuilderConfig, Event, report_from_events};
//! use std::time::Duration;
//!
//! let events = vec![
//!     Event::RunTest { name: "TestA".to_owned() },
//!     Event::Output { data: "    hello\n".to_owned() },
//!     Event::EndTest {
//!         name: "TestA".to_owned(),
//!         result: TestResult::Pass,
//!         duration: Duration::from_millis(1),
//!         indent: 0,
//!     },
//!     Event::Status,
//!     Event::Summary {
//!         name: "pkg".to_owned(),
//!         result: TestResult::Pass,
//!         duration: Duration::from_millis(1),
//!         data: None,
//!     },
//! ];
//!
//! let report = report_from_events(events, BuilderConfig::default());
//! assert!(report.is_successful());
//! assert_eq!(report.packages()[0].tests[0].output, ["hello\n"]);
//! ```

mod assemble;
mod builder;
pub mod config;
mod dispatch;
pub mod errors;
mod events;
mod normalize;
mod tracker;

pub use builder::ReportBuilder;
pub use config::{BuilderConfig, SubtestMode};
pub use dispatch::{report_from_events, report_from_raw_events};
pub use events::{BenchmarkMetrics, Event, RawEvent, read_events};
pub use normalize::trim_tool_indent;

/// The package property that stores a summary event's auxiliary data, e.g. `[no test files]`.
pub const SUMMARY_PROPERTY: &str = "summary";

/// The package property listing other packages a coverage figure was measured against.
pub const COVERAGE_PACKAGES_PROPERTY: &str = "coverage.packages";
