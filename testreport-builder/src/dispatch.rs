// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps events to report builder operations.

use crate::{
    builder::ReportBuilder,
    config::BuilderConfig,
    errors::UnknownEventKind,
    events::{Event, RawEvent},
};
use testreport::Report;
use tracing::warn;

impl ReportBuilder {
    /// Applies a single event to the report under construction.
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::RunTest { name } => self.create_test(&name),
            Event::PauseTest { name } => self.pause_test(&name),
            Event::ContTest { name } => self.continue_test(&name),
            Event::EndTest {
                name,
                result,
                duration,
                indent,
            } => self.end_test(&name, result, duration, indent),
            Event::Benchmark { name, metrics } => self.benchmark(&name, metrics),
            Event::Status => self.end(),
            Event::Summary {
                name,
                result,
                duration,
                data,
            } => self.create_package(&name, result, duration, data),
            Event::Coverage { percent, packages } => self.coverage(percent, packages),
            Event::BuildOutput { name } => self.create_build_error(&name),
            Event::Output { data } => self.append_output(data),
        }
    }

    /// Applies a wire-form event.
    ///
    /// Events with an unrecognized discriminant leave the builder untouched and return an error;
    /// the stream can keep going.
    pub fn apply_raw(&mut self, raw: RawEvent) -> Result<(), UnknownEventKind> {
        self.apply(Event::try_from(raw)?);
        Ok(())
    }
}

/// Builds a report from a sequence of events.
pub fn report_from_events(
    events: impl IntoIterator<Item = Event>,
    config: BuilderConfig,
) -> Report {
    let mut builder = ReportBuilder::new(config);
    for event in events {
        builder.apply(event);
    }
    builder.build()
}

/// Builds a report from a sequence of wire-form events.
///
/// Events with an unrecognized discriminant are logged as warnings and skipped.
pub fn report_from_raw_events(
    events: impl IntoIterator<Item = RawEvent>,
    config: BuilderConfig,
) -> Report {
    let mut builder = ReportBuilder::new(config);
    for event in events {
        if let Err(error) = builder.apply_raw(event) {
            warn!("{error}, skipping");
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use testreport::TestResult;

    #[test]
    fn unknown_raw_event_is_skipped() {
        let mut builder = ReportBuilder::default();
        builder.apply_raw(RawEvent::new("run_test", "TestA")).unwrap();
        let error = builder
            .apply_raw(RawEvent::new("teleport", "TestA"))
            .unwrap_err();
        assert_eq!(error.kind(), "teleport");

        let mut end = RawEvent::new("end_test", "TestA");
        end.result = Some("PASS".to_owned());
        builder.apply_raw(end).unwrap();

        let report = builder.build();
        assert_eq!(report.test_count(), 1);
        assert!(report.is_successful());
    }

    #[test]
    fn events_map_to_operations() {
        let events = vec![
            Event::BuildOutput {
                name: "broken".to_owned(),
            },
            Event::Output {
                data: "broken.go:3: syntax error\n".to_owned(),
            },
            Event::Summary {
                name: "broken".to_owned(),
                result: TestResult::Fail,
                duration: Duration::ZERO,
                data: Some("[build failed]".to_owned()),
            },
            Event::RunTest {
                name: "TestA".to_owned(),
            },
            Event::PauseTest {
                name: "TestA".to_owned(),
            },
            Event::ContTest {
                name: "TestA".to_owned(),
            },
            Event::Output {
                data: "    log line\n".to_owned(),
            },
            Event::EndTest {
                name: "TestA".to_owned(),
                result: TestResult::Skip,
                duration: Duration::from_millis(3),
                indent: 0,
            },
            Event::Status,
            Event::Coverage {
                percent: 50.0,
                packages: vec!["ok".to_owned()],
            },
            Event::Summary {
                name: "ok".to_owned(),
                result: TestResult::Pass,
                duration: Duration::from_millis(4),
                data: None,
            },
        ];

        let report = report_from_events(events, BuilderConfig::default());
        let [broken, ok] = report.packages() else {
            panic!("expected two packages");
        };
        assert_eq!(
            broken.build_error.as_ref().unwrap().output,
            ["broken.go:3: syntax error\n"]
        );
        assert_eq!(ok.tests[0].result, TestResult::Skip);
        assert_eq!(ok.tests[0].output, ["log line\n"]);
        assert_eq!(ok.coverage, Some(50.0));
        assert!(ok.is_successful());
        assert!(!report.is_successful());
    }
}
