// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the report builder.

use crate::errors::{ConfigParseError, SubtestModeParseError};
use serde::Deserialize;
use std::{fmt, str::FromStr};

/// Options controlling how a report is built.
///
/// Can be constructed directly or loaded from TOML:
///
/// ```toml
/// package-name = "example.com/calc"
/// subtest-mode = "exclude-parents"
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuilderConfig {
    /// The name given to a package whose events never received a summary.
    #[serde(default)]
    pub package_name: String,

    /// How tests that have subtests are reported.
    #[serde(default)]
    pub subtest_mode: SubtestMode,
}

impl BuilderConfig {
    /// Creates a new `BuilderConfig` with the given fallback package name.
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            subtest_mode: SubtestMode::default(),
        }
    }

    /// Sets the subtest mode.
    pub fn set_subtest_mode(&mut self, subtest_mode: SubtestMode) -> &mut Self {
        self.subtest_mode = subtest_mode;
        self
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigParseError> {
        toml::from_str(input).map_err(ConfigParseError::new)
    }
}

/// How tests that have subtests (parents) are reported.
///
/// A test is a parent if another test in the same package is named `<parent>/<subtest>`.
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SubtestMode {
    /// Report parent tests like any other test.
    #[default]
    IncludeParents,

    /// Report parent tests as passed, regardless of their own result.
    IgnoreParentResults,

    /// Leave parent tests out of the report. Their output is kept as package output.
    ExcludeParents,
}

impl SubtestMode {
    /// Returns string representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &[
            "include-parents",
            "ignore-parent-results",
            "exclude-parents",
        ]
    }
}

impl fmt::Display for SubtestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubtestMode::IncludeParents => write!(f, "include-parents"),
            SubtestMode::IgnoreParentResults => write!(f, "ignore-parent-results"),
            SubtestMode::ExcludeParents => write!(f, "exclude-parents"),
        }
    }
}

impl FromStr for SubtestMode {
    type Err = SubtestModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "include-parents" => SubtestMode::IncludeParents,
            "ignore-parent-results" => SubtestMode::IgnoreParentResults,
            "exclude-parents" => SubtestMode::ExcludeParents,
            other => return Err(SubtestModeParseError::new(other)),
        };
        Ok(val)
    }
}
