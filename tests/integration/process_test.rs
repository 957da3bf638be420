//! Integration tests running real converter processes.
//!
//! The converters are small `/bin/sh` scripts written to a temporary
//! directory, so these only run on unix hosts.

#![cfg(unix)]

mod helpers;

use std::time::{Duration, Instant};

use bibhub::{ConversionError, ConversionRequest, FormatCode};
use bibhub_core::config::converter::ExitStatusPolicy;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_stdin_is_closed_and_stdout_collected() {
    let dir = tempfile::tempdir().expect("tempdir");
    // `cat` only exits once it sees EOF on stdin.
    helpers::write_script(dir.path(), "ris2xml", "cat");
    let converter = helpers::process_converter(dir.path(), 10, ExitStatusPolicy::Strict);

    let output = converter
        .convert_str("ris", "xml", "TY  - JOUR\nER  - \n")
        .await
        .expect("convert");

    assert_eq!(output.to_string_lossy(), "TY  - JOUR\nER  - \n");
    assert_eq!(output.hops[0].exit_code, Some(0));
}

#[tokio::test]
async fn test_large_input_does_not_deadlock() {
    let dir = tempfile::tempdir().expect("tempdir");
    helpers::write_script(dir.path(), "bib2xml", "cat");
    let converter = helpers::process_converter(dir.path(), 30, ExitStatusPolicy::Strict);

    let input = "@misc{key, title={x}}\n".repeat(100_000);
    let output = converter
        .convert_str("bib", "xml", input.clone())
        .await
        .expect("convert");

    assert_eq!(output.content.len(), input.len());
}

#[tokio::test]
async fn test_two_hops_pipe_through_real_processes() {
    let dir = tempfile::tempdir().expect("tempdir");
    helpers::write_script(
        dir.path(),
        "bib2xml",
        "printf '<mods>'; cat; printf '</mods>'; echo 'bib2xml: Processed 1 references.' >&2",
    );
    helpers::write_script(dir.path(), "xml2ris", "tr 'a-z' 'A-Z'");
    let converter = helpers::process_converter(dir.path(), 10, ExitStatusPolicy::Strict);

    let output = converter
        .convert_str("bib", "ris", "@article")
        .await
        .expect("convert");

    assert_eq!(output.to_string_lossy(), "<MODS>@ARTICLE</MODS>");
    assert_eq!(output.hops.len(), 2);
    assert!(output.hops[0].stderr.contains("Processed 1 references"));
    assert!(output.hops[1].stderr.is_empty());
}

#[tokio::test]
async fn test_args_reach_the_right_hop() {
    let dir = tempfile::tempdir().expect("tempdir");
    helpers::write_script(dir.path(), "end2xml", "cat >/dev/null; printf '%s ' \"$@\"");
    helpers::write_script(dir.path(), "xml2bib", "cat; printf '| %s' \"$@\"");
    let converter = helpers::process_converter(dir.path(), 10, ExitStatusPolicy::Strict);

    let request = ConversionRequest::new(FormatCode::EndNote, FormatCode::Bibtex, "%0 Book")
        .with_source_args(["-u", "-i"])
        .with_target_args(["-b"]);
    let output = converter.convert(request).await.expect("convert");

    assert_eq!(output.to_string_lossy(), "-u -i | -b");
}

#[tokio::test]
async fn test_nonzero_exit_under_each_policy() {
    let dir = tempfile::tempdir().expect("tempdir");
    helpers::write_script(dir.path(), "isi2xml", "cat; echo 'isi2xml: bad tag' >&2; exit 3");
    helpers::write_script(dir.path(), "copac2xml", "cat >/dev/null; exit 2");

    let strict = helpers::process_converter(dir.path(), 10, ExitStatusPolicy::Strict);
    let err = strict
        .convert_str("isi", "xml", "PT J")
        .await
        .unwrap_err();
    match err {
        ConversionError::ProcessFailed { code, stderr, .. } => {
            assert_eq!(code, Some(3));
            assert!(stderr.contains("bad tag"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let lenient = helpers::process_converter(dir.path(), 10, ExitStatusPolicy::Lenient);
    let output = lenient
        .convert_str("isi", "xml", "PT J")
        .await
        .expect("lenient keeps output");
    assert_eq!(output.to_string_lossy(), "PT J");
    assert_eq!(output.hops[0].exit_code, Some(3));
    assert!(matches!(
        lenient.convert_str("copac", "xml", "TI- x").await,
        Err(ConversionError::ProcessFailed { code: Some(2), .. })
    ));

    let ignore = helpers::process_converter(dir.path(), 10, ExitStatusPolicy::Ignore);
    let output = ignore
        .convert_str("copac", "xml", "TI- x")
        .await
        .expect("ignore keeps output");
    assert!(output.content.is_empty());
}

#[tokio::test]
async fn test_failed_first_hop_never_starts_second() {
    let dir = tempfile::tempdir().expect("tempdir");
    let marker = dir.path().join("second-hop-ran");
    helpers::write_script(dir.path(), "bib2xml", "cat >/dev/null; exit 1");
    helpers::write_script(
        dir.path(),
        "xml2ris",
        &format!("cat; touch '{}'", marker.display()),
    );
    let converter = helpers::process_converter(dir.path(), 10, ExitStatusPolicy::Strict);

    let err = converter
        .convert_str("bib", "ris", "@article")
        .await
        .unwrap_err();

    assert!(matches!(err, ConversionError::ProcessFailed { .. }));
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_lenient_policy_never_forwards_failed_intermediate_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let marker = dir.path().join("second-hop-ran");
    helpers::write_script(dir.path(), "bib2xml", "cat >/dev/null; printf 'PARTIAL'; exit 1");
    helpers::write_script(
        dir.path(),
        "xml2ris",
        &format!("cat; touch '{}'", marker.display()),
    );
    let converter = helpers::process_converter(dir.path(), 10, ExitStatusPolicy::Lenient);

    let err = converter
        .convert_str("bib", "ris", "@article")
        .await
        .unwrap_err();

    assert!(matches!(err, ConversionError::ProcessFailed { code: Some(1), .. }));
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_hop_waits_for_exit_not_stdout_close() {
    let dir = tempfile::tempdir().expect("tempdir");
    helpers::write_script(dir.path(), "ris2xml", "cat; exec >&- 2>&-; sleep 5");
    let converter = helpers::process_converter(dir.path(), 1, ExitStatusPolicy::Strict);

    let err = converter
        .convert_str("ris", "xml", "TY  - JOUR")
        .await
        .unwrap_err();

    assert!(matches!(err, ConversionError::Timeout { timeout_seconds: 1, .. }));
}

#[tokio::test]
async fn test_missing_converter_is_spawn_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let converter = helpers::process_converter(dir.path(), 10, ExitStatusPolicy::Strict);

    let err = converter
        .convert_str("nbib", "xml", "PMID- 1")
        .await
        .unwrap_err();

    match err {
        ConversionError::SpawnFailure { program, .. } => {
            assert_eq!(program, dir.path().join("nbib2xml"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_hung_converter_times_out() {
    let dir = tempfile::tempdir().expect("tempdir");
    helpers::write_script(dir.path(), "ebi2xml", "exec sleep 30");
    let converter = helpers::process_converter(dir.path(), 1, ExitStatusPolicy::Strict);

    let start = Instant::now();
    let err = converter
        .convert_str("ebi", "xml", "<ebi/>")
        .await
        .unwrap_err();

    assert!(matches!(err, ConversionError::Timeout { timeout_seconds: 1, .. }));
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(converter.metrics_snapshot().conversions_timed_out, 1);
}

#[tokio::test]
async fn test_cancellation_kills_running_converter() {
    let dir = tempfile::tempdir().expect("tempdir");
    helpers::write_script(dir.path(), "xml2wordbib", "exec sleep 30");
    let converter = helpers::process_converter(dir.path(), 60, ExitStatusPolicy::Strict);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let err = converter
        .convert_with_cancel(
            ConversionRequest::new(FormatCode::Mods, FormatCode::WordBib, "<modsCollection/>"),
            cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ConversionError::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_check_installation_sees_scripts() {
    let dir = tempfile::tempdir().expect("tempdir");
    helpers::write_script(dir.path(), "ris2xml", "cat");
    helpers::write_script(dir.path(), "modsclean", "cat");
    let converter = helpers::process_converter(dir.path(), 10, ExitStatusPolicy::Strict);

    let available: Vec<String> = converter
        .check_installation()
        .await
        .into_iter()
        .filter(|tool| tool.available)
        .map(|tool| helpers::file_name(&tool.program))
        .collect();

    assert_eq!(available.len(), 2);
    assert!(available.contains(&"ris2xml".to_string()));
    assert!(available.contains(&"modsclean".to_string()));
}
