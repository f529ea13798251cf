// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while decoding events and loading configuration.
//!
//! Building a report never fails: these errors only arise at the seams where events and
//! configuration enter the builder.

use crate::config::SubtestMode;
use std::io;
use thiserror::Error;

/// An event had a discriminant the builder doesn't know about.
///
/// The event is skipped; processing of the stream continues.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unhandled event type: `{kind}`")]
pub struct UnknownEventKind {
    kind: String,
}

impl UnknownEventKind {
    pub(crate) fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }

    /// Returns the unrecognized discriminant.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// An error that occurred while decoding newline-delimited JSON events.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EventDecodeError {
    /// The line couldn't be read.
    #[error("error reading event on line {line_number}")]
    Read {
        /// The 1-based line number.
        line_number: usize,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The line wasn't a valid JSON event.
    #[error("error decoding event on line {line_number}")]
    Json {
        /// The 1-based line number.
        line_number: usize,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },
}

/// An error that occurred while parsing builder configuration.
#[derive(Debug, Error)]
#[error("failed to parse report builder config")]
pub struct ConfigParseError {
    #[source]
    err: toml::de::Error,
}

impl ConfigParseError {
    pub(crate) fn new(err: toml::de::Error) -> Self {
        Self { err }
    }
}

/// Error returned while parsing a [`SubtestMode`] value from a string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error(
    "unrecognized value for subtest mode: {input}\n(known values: {})",
    SubtestMode::variants().join(", "),
)]
pub struct SubtestModeParseError {
    input: String,
}

impl SubtestModeParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}
