//! Extraction of per-test verdicts from a nextest JUnit report.
//!
//! A `<testcase>` with a `<failure>` or `<error>` child failed; any other testcase passed.
//! Testcases marked `<skipped>` did not run and are left out.

use crate::error::RunnerError;
use marker::types::Verdict;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

struct OpenCase {
    verdict: Verdict,
    skipped: bool,
}

pub fn parse_junit(xml: &str) -> Result<Vec<Verdict>, RunnerError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut verdicts = Vec::new();
    let mut root_seen = false;
    let mut depth = 0usize;
    let mut current: Option<OpenCase> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            RunnerError::InvalidJunit(format!("at byte {}: {e}", reader.buffer_position()))
        })?;

        match event {
            Event::Start(e) => {
                check_root(&mut root_seen, &e)?;
                depth += 1;
                match e.local_name().as_ref() {
                    b"testcase" => {
                        current = Some(OpenCase {
                            verdict: Verdict::passed(case_name(&e)?),
                            skipped: false,
                        });
                    }
                    other => mark(&mut current, other),
                }
            }
            Event::Empty(e) => {
                check_root(&mut root_seen, &e)?;
                match e.local_name().as_ref() {
                    b"testcase" => verdicts.push(Verdict::passed(case_name(&e)?)),
                    other => mark(&mut current, other),
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if e.local_name().as_ref() == b"testcase" {
                    if let Some(case) = current.take() {
                        if !case.skipped {
                            verdicts.push(case.verdict);
                        }
                    }
                }
            }
            Event::Eof => {
                if !root_seen {
                    return Err(RunnerError::InvalidJunit(
                        "no <testsuites> element".to_string(),
                    ));
                }
                if depth != 0 {
                    return Err(RunnerError::InvalidJunit(
                        "document ends inside an open element".to_string(),
                    ));
                }
                break;
            }
            _ => {}
        }
    }

    Ok(verdicts)
}

fn check_root(root_seen: &mut bool, e: &BytesStart) -> Result<(), RunnerError> {
    if *root_seen {
        return Ok(());
    }
    match e.local_name().as_ref() {
        b"testsuites" | b"testsuite" => {
            *root_seen = true;
            Ok(())
        }
        other => Err(RunnerError::InvalidJunit(format!(
            "unexpected root element <{}>",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn mark(current: &mut Option<OpenCase>, child: &[u8]) {
    let Some(case) = current.as_mut() else {
        return;
    };
    match child {
        b"failure" | b"error" => case.verdict.passed = false,
        b"skipped" => case.skipped = true,
        _ => {}
    }
}

fn case_name(e: &BytesStart) -> Result<String, RunnerError> {
    let attr = e
        .try_get_attribute("name")
        .map_err(|err| RunnerError::InvalidJunit(err.to_string()))?
        .ok_or_else(|| RunnerError::InvalidJunit("testcase without a name".to_string()))?;
    let raw = std::str::from_utf8(&attr.value)
        .map_err(|err| RunnerError::InvalidJunit(err.to_string()))?;
    let name = quick_xml::escape::unescape(raw)
        .map_err(|err| RunnerError::InvalidJunit(err.to_string()))?;
    Ok(name.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites name="nextest-run" tests="4" failures="1" errors="1" uuid="0" timestamp="2024-01-01T00:00:00Z" time="1.2">
    <testsuite name="runtime::grading" tests="4" disabled="0" errors="1" failures="1">
        <testcase name="currency::fundamentals::transfer_works" classname="runtime::grading" timestamp="2024-01-01T00:00:00Z" time="0.1">
        </testcase>
        <testcase name="currency::fundamentals::burn_works" classname="runtime::grading" timestamp="2024-01-01T00:00:00Z" time="0.2">
            <failure message="thread panicked" type="test failure">assertion `left == right` failed</failure>
            <system-err>thread 'currency::fundamentals::burn_works' panicked</system-err>
        </testcase>
        <testcase name="currency::fundamentals::mint_&lt;u128&gt;" classname="runtime::grading" time="0.1"/>
        <testcase name="currency::fundamentals::slow" classname="runtime::grading" time="600.0">
            <error message="test timed out" type="timeout"/>
        </testcase>
    </testsuite>
</testsuites>
"#;

    #[test]
    fn test_parses_verdicts_in_document_order() {
        let verdicts = parse_junit(REPORT).unwrap();
        assert_eq!(
            verdicts,
            vec![
                Verdict::passed("currency::fundamentals::transfer_works"),
                Verdict::failed("currency::fundamentals::burn_works"),
                Verdict::passed("currency::fundamentals::mint_<u128>"),
                Verdict::failed("currency::fundamentals::slow"),
            ]
        );
    }

    #[test]
    fn test_skipped_cases_are_left_out() {
        let xml = r#"<testsuites><testsuite name="s">
            <testcase name="a"><skipped/></testcase>
            <testcase name="b"/>
        </testsuite></testsuites>"#;
        assert_eq!(parse_junit(xml).unwrap(), vec![Verdict::passed("b")]);
    }

    #[test]
    fn test_empty_report_has_no_verdicts() {
        assert!(parse_junit("<testsuites/>").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_wrong_root() {
        let err = parse_junit("<html><body/></html>").unwrap_err();
        assert!(matches!(err, RunnerError::InvalidJunit(_)));
    }

    #[test]
    fn test_rejects_truncated_report() {
        let truncated = &REPORT[..REPORT.find("</testsuite>").unwrap()];
        assert!(parse_junit(truncated).is_err());
    }

    #[test]
    fn test_rejects_empty_document() {
        assert!(parse_junit("").is_err());
    }
}
