// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Data model for hierarchical test run reports.
//!
//! A [`Report`] groups the results of a test run by [`Package`]. Each package carries its tests
//! (possibly nested as subtests), benchmarks, unattributed output, coverage, and at most one build
//! error and one run error. Reports are built by `testreport-builder` and consumed by renderers.

mod errors;
mod report;

pub use errors::*;
pub use report::*;
