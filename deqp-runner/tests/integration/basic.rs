// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-configuration runs: API gating, result codes, batching and the package lifecycle.

use crate::fixtures::*;
use color_eyre::eyre::Result;
use deqp_runner::{
    list::BatchRunConfiguration,
    reporter::{JunitListener, TeeListener},
    runner::DeqpTestRunner,
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use test_case::test_case;

const DEFAULT: &str = "{glformat=rgba8888d24s8,rotation=unspecified,surfacetype=window}";

fn failed(config: &str, outcome: &str) -> Option<String> {
    Some(format!("=== with config {config} ===\n{outcome}"))
}

#[test_case("dEQP-GLES3", Some(GLES3), true; "gles3 on gles3")]
#[test_case("dEQP-GLES31", Some(GLES3), false; "gles31 on gles3")]
#[test_case("dEQP-GLES31", Some(GLES31), true; "gles31 on gles31")]
#[test_case("dEQP-GLES2", Some(GLES3), true; "gles2 on gles3")]
#[test_case("dEQP-GLES3", None, false; "missing version property")]
#[test_case("dEQP-EGL", None, true; "egl has no version requirement")]
fn api_version_gate(suite: &str, gles_version: Option<&str>, runs: bool) -> Result<()> {
    let config = load_config("")?;
    let path = format!("{suite}.info.version");
    let default = BatchRunConfiguration::default();

    let mut device = FakeDevice::new(gles_version);
    device.push_batch(
        &default,
        BatchScript::Output(session(&[case(&path, "Pass", "Pass")])),
    );
    let mut recorder = Recorder::default();
    let runner = DeqpTestRunner::new(suite, instances([(path.as_str(), vec![])]), &config)?;
    let stats = runner.run(&mut device, &mut recorder)?;

    // Either way, the test is reported once and passes.
    let test = id(&path).to_string();
    assert_eq!(
        recorder.events,
        vec![
            format!("run_started arm64-v8a {suite} 1"),
            format!("started {test}"),
            format!("ended {test}"),
            "run_ended".to_owned(),
        ]
    );
    assert_eq!(stats.passed, 1);
    assert_eq!(stats.api_unsupported, !runs);

    if runs {
        assert_eq!(device.instrument_commands().len(), 1);
        assert_eq!(
            device.case_lists,
            vec![format!("{{{suite}{{info{{version}}}}}}\n")]
        );
    } else {
        assert!(device.commands.is_empty(), "nothing runs: {:?}", device.commands);
    }

    // EGL suites have no render configuration query.
    let expected_queries = usize::from(runs && suite != "dEQP-EGL");
    assert_eq!(device.query_commands().len(), expected_queries);
    Ok(())
}

#[test]
fn result_codes() -> Result<()> {
    let config = load_config("")?;
    let default = BatchRunConfiguration::default();
    let codes = [
        ("pass", "Pass", "Pass"),
        ("fail", "Fail", "Fail"),
        ("not_supported", "NotSupported", "GL_EXT_foo not supported"),
        ("quality_warning", "QualityWarning", "Slow"),
        ("compatibility_warning", "CompatibilityWarning", "Odd"),
        ("resource_error", "ResourceError", "Out of memory"),
        ("internal_error", "InternalError", "Oops"),
        ("crash", "Crash", "Segfault"),
        ("timeout", "Timeout", "Took too long"),
        ("unknown", "Bogus", "Who knows"),
    ];

    let paths: Vec<String> = codes
        .iter()
        .map(|(name, _, _)| format!("dEQP-GLES3.codes.{name}"))
        .collect();
    let cases: Vec<String> = paths
        .iter()
        .zip(&codes)
        .map(|(path, (_, code, details))| case(path, code, details))
        .collect();

    let mut device = FakeDevice::new(Some(GLES3));
    device.push_batch(&default, BatchScript::Output(session(&cases)));
    let instances = instances(paths.iter().map(|path| (path.as_str(), vec![])));
    let runner = DeqpTestRunner::new("dEQP-GLES3", instances, &config)?;
    let mut recorder = Recorder::default();
    let stats = runner.run(&mut device, &mut recorder)?;

    assert_eq!(
        recorder.verdicts(),
        vec![
            ("dEQP-GLES3.codes#pass".to_owned(), None),
            ("dEQP-GLES3.codes#fail".to_owned(), failed(DEFAULT, "Fail: Fail")),
            ("dEQP-GLES3.codes#not_supported".to_owned(), None),
            ("dEQP-GLES3.codes#quality_warning".to_owned(), None),
            ("dEQP-GLES3.codes#compatibility_warning".to_owned(), None),
            (
                "dEQP-GLES3.codes#resource_error".to_owned(),
                failed(DEFAULT, "ResourceError: Out of memory")
            ),
            (
                "dEQP-GLES3.codes#internal_error".to_owned(),
                failed(DEFAULT, "InternalError: Oops")
            ),
            ("dEQP-GLES3.codes#crash".to_owned(), failed(DEFAULT, "Crash: Segfault")),
            (
                "dEQP-GLES3.codes#timeout".to_owned(),
                failed(DEFAULT, "Timeout: Took too long")
            ),
            (
                "dEQP-GLES3.codes#unknown".to_owned(),
                failed(DEFAULT, "Unknown result code: Bogus: Who knows")
            ),
        ]
    );
    assert_eq!(stats.passed, 4);
    assert_eq!(stats.failed, 6);
    assert!(stats.has_failures());
    Ok(())
}

#[test]
fn package_lifecycle() -> Result<()> {
    let config = load_config(indoc! {r#"
        [runner]
        apk-path = "deqp.apk"
    "#})?;
    let default = BatchRunConfiguration::default();

    let mut device = FakeDevice::new(Some(GLES3));
    device.push_batch(
        &default,
        BatchScript::Output(session(&[case("dEQP-GLES3.info.version", "Pass", "Pass")])),
    );
    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([("dEQP-GLES3.info.version", vec![])]),
        &config,
    )?;
    runner.run(&mut device, &mut Recorder::default())?;

    assert_eq!(
        device.command_summary(),
        vec![
            "uninstall com.drawelements.deqp",
            "install deqp.apk",
            // Render configuration query.
            "am instrument",
            "push /sdcard/dEQP-TestCaseList.txt",
            "am instrument",
            "uninstall com.drawelements.deqp",
        ]
    );
    assert!(
        device.commands[1].ends_with("--abi arm64-v8a"),
        "install passes the ABI: {}",
        device.commands[1]
    );
    Ok(())
}

#[test]
fn truncated_log_crashes_open_test_and_retries_the_rest() -> Result<()> {
    let config = load_config("")?;
    let default = BatchRunConfiguration::default();

    let mut device = FakeDevice::new(Some(GLES3));
    // The tester dies partway through the second test.
    device.push_batch(
        &default,
        BatchScript::Output(
            [
                case("dEQP-GLES3.a.first", "Pass", "Pass"),
                begin("dEQP-GLES3.a.second"),
            ]
            .concat(),
        ),
    );
    device.push_batch(
        &default,
        BatchScript::Output(session(&[case("dEQP-GLES3.a.third", "Pass", "Pass")])),
    );

    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([
            ("dEQP-GLES3.a.first", vec![]),
            ("dEQP-GLES3.a.second", vec![]),
            ("dEQP-GLES3.a.third", vec![]),
        ]),
        &config,
    )?;
    let mut recorder = Recorder::default();
    runner.run(&mut device, &mut recorder)?;

    assert_eq!(
        recorder.verdicts(),
        vec![
            ("dEQP-GLES3.a#first".to_owned(), None),
            (
                "dEQP-GLES3.a#second".to_owned(),
                failed(DEFAULT, "Crash: Incomplete test log")
            ),
            ("dEQP-GLES3.a#third".to_owned(), None),
        ]
    );
    assert_eq!(
        device.case_lists,
        vec![
            "{dEQP-GLES3{a{first,second,third}}}\n",
            "{dEQP-GLES3{a{third}}}\n",
        ]
    );
    // The support verdict is cached for the run.
    assert_eq!(device.query_commands().len(), 1);
    Ok(())
}

#[test]
fn terminated_test() -> Result<()> {
    let config = load_config("")?;
    let default = BatchRunConfiguration::default();

    let mut device = FakeDevice::new(Some(GLES3));
    device.push_batch(
        &default,
        BatchScript::Output(session(&[[
            begin("dEQP-GLES3.a.first"),
            terminate("Watchdog timer"),
            end(),
        ]
        .concat()])),
    );
    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([("dEQP-GLES3.a.first", vec![])]),
        &config,
    )?;
    let mut recorder = Recorder::default();
    runner.run(&mut device, &mut recorder)?;

    assert_eq!(
        recorder.verdicts(),
        vec![(
            "dEQP-GLES3.a#first".to_owned(),
            failed(DEFAULT, "Terminated: Watchdog timer")
        )]
    );
    Ok(())
}

#[test]
fn batches_are_bounded_by_batch_size() -> Result<()> {
    let config = load_config(indoc! {"
        [runner]
        batch-size = 2
    "})?;
    let default = BatchRunConfiguration::default();

    let mut device = FakeDevice::new(Some(GLES3));
    device.push_batch(
        &default,
        BatchScript::Output(session(&[
            case("dEQP-GLES3.a.one", "Pass", "Pass"),
            case("dEQP-GLES3.a.two", "Pass", "Pass"),
        ])),
    );
    device.push_batch(
        &default,
        BatchScript::Output(session(&[case("dEQP-GLES3.b.three", "Fail", "Bad pixels")])),
    );

    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([
            ("dEQP-GLES3.a.one", vec![]),
            ("dEQP-GLES3.a.two", vec![]),
            ("dEQP-GLES3.b.three", vec![]),
        ]),
        &config,
    )?;
    let mut recorder = Recorder::default();
    let stats = runner.run(&mut device, &mut recorder)?;

    assert_eq!(
        device.case_lists,
        vec!["{dEQP-GLES3{a{one,two}}}\n", "{dEQP-GLES3{b{three}}}\n"]
    );
    assert_eq!(stats.passed, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(recorder.events.last().map(String::as_str), Some("run_ended"));
    Ok(())
}

#[test]
fn logs_are_reported_when_collected() -> Result<()> {
    let config = load_config(indoc! {"
        [runner]
        collect-logs = true
    "})?;
    let default = BatchRunConfiguration::default();

    let mut device = FakeDevice::new(Some(GLES3));
    device.push_batch(
        &default,
        BatchScript::Output(session(&[[
            begin("dEQP-GLES3.a.first"),
            log("<Result>Fail</Result>"),
            result("Fail", "Fail"),
            end(),
        ]
        .concat()])),
    );
    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([("dEQP-GLES3.a.first", vec![])]),
        &config,
    )?;
    let mut recorder = Recorder::default();
    runner.run(&mut device, &mut recorder)?;

    assert!(
        device.instrument_commands()[0].contains("-e deqpLogData \"true\""),
        "log collection is requested"
    );
    assert_eq!(
        recorder.events,
        vec![
            "run_started arm64-v8a dEQP-GLES3 1".to_owned(),
            "started dEQP-GLES3.a#first".to_owned(),
            "log dEQP-GLES3.a#first".to_owned(),
            format!("failed dEQP-GLES3.a#first: === with config {DEFAULT} ===\nFail: Fail"),
            "ended dEQP-GLES3.a#first".to_owned(),
            "run_ended".to_owned(),
        ]
    );
    assert_eq!(
        recorder.logs,
        vec![(
            format!("dEQP-GLES3.a.first@{DEFAULT}"),
            "<Result>Fail</Result>".to_owned()
        )]
    );
    Ok(())
}

#[test]
fn junit_report_is_written() -> Result<()> {
    let dir = camino_tempfile::tempdir()?;
    let junit_path = dir.path().join("out/junit.xml");
    let config = load_config(&format!("[junit]\npath = {:?}\n", junit_path.as_str()))?;
    let default = BatchRunConfiguration::default();

    let mut device = FakeDevice::new(Some(GLES3));
    device.push_batch(
        &default,
        BatchScript::Output(session(&[
            case("dEQP-GLES3.info.version", "Pass", "Pass"),
            case("dEQP-GLES3.info.vendor", "Fail", "Wrong vendor"),
        ])),
    );
    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([
            ("dEQP-GLES3.info.version", vec![]),
            ("dEQP-GLES3.info.vendor", vec![]),
        ]),
        &config,
    )?;

    let junit_config = config.junit().expect("junit path is set");
    let mut junit = JunitListener::new(junit_config);
    let mut recorder = Recorder::default();
    runner.run(&mut device, &mut TeeListener::new(&mut recorder, &mut junit))?;

    let xml = std::fs::read_to_string(&junit_path)?;
    assert!(
        xml.contains(r#"<testsuite name="arm64-v8a dEQP-GLES3" tests="2""#),
        "{xml}"
    );
    assert!(
        xml.contains(r#"<failure message="Fail: Wrong vendor""#),
        "{xml}"
    );
    assert_eq!(recorder.verdicts().len(), 2);
    Ok(())
}
