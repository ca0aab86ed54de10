// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs where tests have several render configurations.

use crate::fixtures::*;
use color_eyre::eyre::Result;
use deqp_runner::{
    errors::{DeviceError, RunError},
    list::{BatchRunConfiguration, Rotation},
    reporter::{JunitListener, TeeListener},
    runner::DeqpTestRunner,
};
use std::time::Duration;
use pretty_assertions::assert_eq;
use test_case::test_case;

fn rotated(rotation: Rotation) -> BatchRunConfiguration {
    BatchRunConfiguration::new(
        BatchRunConfiguration::DEFAULT_GL_CONFIG,
        rotation,
        BatchRunConfiguration::DEFAULT_SURFACE_TYPE,
    )
}

fn block(config: &BatchRunConfiguration, outcome: &str) -> String {
    format!("=== with config {config} ===\n{outcome}")
}

#[test]
fn multiple_instances() -> Result<()> {
    let config = load_config("")?;
    let a = BatchRunConfiguration::default();
    let b = rotated(Rotation::Landscape);
    let c = rotated(Rotation::ReversePortrait);
    let unsupported = BatchRunConfiguration::new("rgb565d16s0", Rotation::Unspecified, "window");

    let mut device = FakeDevice::new(Some(GLES3));
    device.set_query_answer(&unsupported, "No");
    // The tester dies during crashtwo. failone already has a result, which stands.
    device.push_batch(
        &a,
        BatchScript::Output(
            [
                case("dEQP-GLES3.instances.passall", "Pass", "Pass"),
                begin("dEQP-GLES3.instances.failone"),
                result("Pass", "Pass"),
                begin("dEQP-GLES3.instances.crashtwo"),
            ]
            .concat(),
        ),
    );
    device.push_batch(
        &b,
        BatchScript::Output(session(&[
            case("dEQP-GLES3.instances.passall", "Pass", "Pass"),
            [
                begin("dEQP-GLES3.instances.crashtwo"),
                terminate("Magic"),
                end(),
            ]
            .concat(),
            case("dEQP-GLES3.instances.skipone", "Pass", "Pass"),
        ])),
    );
    device.push_batch(
        &c,
        BatchScript::Output(session(&[
            case("dEQP-GLES3.instances.failone", "Fail", "Fail"),
            case("dEQP-GLES3.instances.crashtwo", "Pass", "Pass"),
        ])),
    );

    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([
            ("dEQP-GLES3.instances.passall", vec![a.clone(), b.clone()]),
            ("dEQP-GLES3.instances.failone", vec![a.clone(), c.clone()]),
            (
                "dEQP-GLES3.instances.crashtwo",
                vec![a.clone(), c.clone(), b.clone()],
            ),
            (
                "dEQP-GLES3.instances.skipone",
                vec![b.clone(), unsupported.clone()],
            ),
        ]),
        &config,
    )?;
    let mut recorder = Recorder::default();
    let stats = runner.run(&mut device, &mut recorder)?;

    // Configurations run in first-seen order, each with only the tests that still need it.
    assert_eq!(
        device.case_lists,
        vec![
            "{dEQP-GLES3{instances{passall,failone,crashtwo}}}\n",
            "{dEQP-GLES3{instances{passall,crashtwo,skipone}}}\n",
            "{dEQP-GLES3{instances{failone,crashtwo}}}\n",
        ]
    );
    assert_eq!(device.query_commands().len(), 4);
    assert_eq!(
        device
            .commands
            .iter()
            .filter(|command| *command == "pm list features")
            .count(),
        1,
        "the feature list is read once"
    );

    // Tests are reported as soon as their last configuration is done.
    assert_eq!(
        recorder.verdicts(),
        vec![
            ("dEQP-GLES3.instances#passall".to_owned(), None),
            (
                "dEQP-GLES3.instances#failone".to_owned(),
                Some(block(&c, "Fail: Fail"))
            ),
            (
                "dEQP-GLES3.instances#crashtwo".to_owned(),
                Some(format!(
                    "{}\n{}",
                    block(&a, "Crash: Incomplete test log"),
                    block(&b, "Terminated: Magic")
                ))
            ),
            ("dEQP-GLES3.instances#skipone".to_owned(), None),
        ]
    );
    assert_eq!(stats.passed, 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.unsupported_instances, 1);
    Ok(())
}

#[test]
fn orientation_requires_device_feature() -> Result<()> {
    let config = load_config("")?;
    let default = BatchRunConfiguration::default();
    let landscape = rotated(Rotation::Landscape);
    let portrait = rotated(Rotation::Portrait);

    let mut device = FakeDevice::new(Some(GLES3));
    device.set_features("feature:android.hardware.screen.portrait\n");
    for config in [&default, &portrait] {
        device.push_batch(
            config,
            BatchScript::Output(session(&[case("dEQP-GLES3.a.first", "Pass", "Pass")])),
        );
    }

    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([(
            "dEQP-GLES3.a.first",
            vec![default.clone(), landscape.clone(), portrait.clone()],
        )]),
        &config,
    )?;
    let mut recorder = Recorder::default();
    let stats = runner.run(&mut device, &mut recorder)?;

    assert_eq!(
        recorder.verdicts(),
        vec![("dEQP-GLES3.a#first".to_owned(), None)]
    );
    // Landscape is rejected from the feature list without a render query.
    assert_eq!(device.query_commands().len(), 2);
    assert_eq!(device.instrument_commands().len(), 2);
    assert!(
        device
            .instrument_commands()
            .iter()
            .all(|command| !command.contains("--deqp-screen-rotation=90")),
    );
    assert_eq!(stats.unsupported_instances, 1);
    Ok(())
}

#[test]
fn malformed_feature_list_rejects_orientations() -> Result<()> {
    let config = load_config("")?;
    let default = BatchRunConfiguration::default();
    let portrait = rotated(Rotation::Portrait);

    let mut device = FakeDevice::new(Some(GLES3));
    device.set_features("feature:android.hardware.screen.portrait\nError: could not access the Package Manager\n");
    device.push_batch(
        &default,
        BatchScript::Output(session(&[case("dEQP-GLES3.a.first", "Fail", "Fail")])),
    );

    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([("dEQP-GLES3.a.first", vec![default.clone(), portrait])]),
        &config,
    )?;
    let mut recorder = Recorder::default();
    let stats = runner.run(&mut device, &mut recorder)?;

    assert_eq!(
        recorder.verdicts(),
        vec![(
            "dEQP-GLES3.a#first".to_owned(),
            Some(block(&default, "Fail: Fail"))
        )]
    );
    assert_eq!(device.instrument_commands().len(), 1);
    assert_eq!(stats.unsupported_instances, 1);
    Ok(())
}

#[test_case("No"; "rejected")]
#[test_case("Maybe?"; "unexpected answer")]
fn unsupported_render_config_contributes_nothing(answer: &str) -> Result<()> {
    let config = load_config("")?;
    let rgb565 = BatchRunConfiguration::new("rgb565d16s0", Rotation::Unspecified, "window");

    let mut device = FakeDevice::new(Some(GLES3));
    device.set_query_answer(&rgb565, answer);

    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([
            ("dEQP-GLES3.a.first", vec![rgb565.clone()]),
            ("dEQP-GLES3.a.second", vec![rgb565.clone()]),
        ]),
        &config,
    )?;
    let mut recorder = Recorder::default();
    let stats = runner.run(&mut device, &mut recorder)?;

    // A test with no executed configuration passes.
    assert_eq!(
        recorder.verdicts(),
        vec![
            ("dEQP-GLES3.a#first".to_owned(), None),
            ("dEQP-GLES3.a#second".to_owned(), None),
        ]
    );
    assert_eq!(device.query_commands().len(), 1, "verdict is cached");
    assert!(device.instrument_commands().is_empty());
    assert!(device.case_lists.is_empty());
    assert_eq!(stats.unsupported_instances, 2);
    Ok(())
}

#[test]
fn device_loss_aborts_run() -> Result<()> {
    let config = load_config("")?;
    let a = BatchRunConfiguration::default();
    let b = rotated(Rotation::Landscape);

    let mut device = FakeDevice::new(Some(GLES3));
    device.push_batch(
        &a,
        BatchScript::Lost(
            [
                case("dEQP-GLES3.a.first", "Pass", "Pass"),
                begin("dEQP-GLES3.a.second"),
            ]
            .concat(),
        ),
    );

    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([
            ("dEQP-GLES3.a.first", vec![a.clone(), b.clone()]),
            ("dEQP-GLES3.a.second", vec![a.clone(), b.clone()]),
        ]),
        &config,
    )?;
    let mut recorder = Recorder::default();
    let error = runner
        .run(&mut device, &mut recorder)
        .expect_err("device was lost");

    assert!(
        matches!(error, RunError::Device(DeviceError::NotAvailable { .. })),
        "{error:?}"
    );
    // Only the in-flight test is reported, and the run never ends.
    assert_eq!(
        recorder.events,
        vec![
            "run_started arm64-v8a dEQP-GLES3 2".to_owned(),
            "started dEQP-GLES3.a#second".to_owned(),
            format!(
                "failed dEQP-GLES3.a#second: {}",
                block(&a, "Crash: Device lost")
            ),
            "ended dEQP-GLES3.a#second".to_owned(),
        ]
    );
    // Nothing else is run, and the package is left installed.
    assert!(
        device
            .commands
            .last()
            .is_some_and(|command| command.contains("DeqpInstrumentation")),
        "{:?}",
        device.commands
    );
    Ok(())
}

#[test]
fn device_loss_mid_instance() -> Result<()> {
    let config = load_config("")?;
    let a = BatchRunConfiguration::default();
    let b = rotated(Rotation::Landscape);
    let c = rotated(Rotation::ReversePortrait);

    let mut device = FakeDevice::new(Some(GLES3));
    device.push_batch(
        &a,
        BatchScript::Output(session(&[case("dEQP-GLES3.loss.instance", "Pass", "Pass")])),
    );
    device.push_batch(&b, BatchScript::Lost(begin("dEQP-GLES3.loss.instance")));
    device.push_batch(
        &c,
        BatchScript::Output(session(&[case("dEQP-GLES3.loss.instance", "Pass", "Pass")])),
    );

    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([(
            "dEQP-GLES3.loss.instance",
            vec![a.clone(), b.clone(), c.clone()],
        )]),
        &config,
    )?;
    let mut recorder = Recorder::default();
    let error = runner
        .run(&mut device, &mut recorder)
        .expect_err("device was lost");

    assert!(
        matches!(error, RunError::Device(DeviceError::NotAvailable { .. })),
        "{error:?}"
    );
    // The passing outcome under the first configuration adds no block.
    assert_eq!(
        recorder.events,
        vec![
            "run_started arm64-v8a dEQP-GLES3 1".to_owned(),
            "started dEQP-GLES3.loss#instance".to_owned(),
            format!(
                "failed dEQP-GLES3.loss#instance: {}",
                block(&b, "Crash: Device lost")
            ),
            "ended dEQP-GLES3.loss#instance".to_owned(),
        ]
    );
    // The third configuration never runs.
    assert_eq!(device.instrument_commands().len(), 2);
    assert!(
        device
            .instrument_commands()
            .iter()
            .all(|command| !command.contains("--deqp-screen-rotation=180")),
    );
    Ok(())
}

#[test]
fn junit_report_survives_device_loss() -> Result<()> {
    let dir = camino_tempfile::tempdir()?;
    let junit_path = dir.path().join("junit.xml");
    let config = load_config(&format!("[junit]\npath = {:?}\n", junit_path.as_str()))?;
    let default = BatchRunConfiguration::default();

    let mut device = FakeDevice::new(Some(GLES3));
    device.push_batch(
        &default,
        BatchScript::Lost(
            [
                case("dEQP-GLES3.a.first", "Fail", "bad"),
                begin("dEQP-GLES3.a.second"),
            ]
            .concat(),
        ),
    );
    let runner = DeqpTestRunner::new(
        "dEQP-GLES3",
        instances([("dEQP-GLES3.a.first", vec![]), ("dEQP-GLES3.a.second", vec![])]),
        &config,
    )?;

    let mut junit = JunitListener::new(config.junit().expect("junit path is set"));
    let mut recorder = Recorder::default();
    let result = runner.run(&mut device, &mut TeeListener::new(&mut recorder, &mut junit));
    assert!(matches!(result, Err(RunError::Device(_))), "{result:?}");
    assert!(!junit_path.exists(), "run_ended is not called on device loss");

    junit.finish(Duration::from_secs(1))?;
    let xml = std::fs::read_to_string(&junit_path)?;
    assert!(
        xml.contains(r#"<testsuite name="arm64-v8a dEQP-GLES3" tests="2""#),
        "{xml}"
    );
    assert!(xml.contains(r#"<failure message="Fail: bad""#), "{xml}");
    assert!(
        xml.contains(r#"<failure message="Crash: Device lost""#),
        "{xml}"
    );
    Ok(())
}
