// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// An error that occurs while parsing a [`TestResult`](crate::TestResult) from a string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unrecognized test result `{input}` (known values: PASS, ok, BENCH, FAIL, SKIP, ?)")]
pub struct ParseTestResultError {
    input: String,
}

impl ParseTestResultError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Returns the input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}
