//! Integration tests for converter location overrides.

mod helpers;

use std::path::PathBuf;
use std::sync::Arc;

use bibhub::{ConversionRequest, FormatCode};
use helpers::{Hold, RecordingRunner};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_set_binary_path_changes_next_invocation() {
    let runner = Arc::new(RecordingRunner::echo());
    let converter = helpers::mock_converter(runner.clone());

    converter.set_binary_path("/custom/path");
    converter
        .convert_str("ris", "xml", "TY  - JOUR")
        .await
        .expect("convert");

    assert_eq!(runner.calls()[0].program, PathBuf::from("/custom/path/ris2xml"));
}

#[tokio::test]
async fn test_custom_suffix_applies_to_both_hops() {
    let runner = Arc::new(RecordingRunner::echo());
    let converter = helpers::mock_converter(runner.clone());

    converter.set_location("/usr/local/bibutils", Some("-static".to_string()));
    converter
        .convert_str("bib", "ris", "@article{k}")
        .await
        .expect("convert");

    let programs: Vec<PathBuf> = runner.calls().into_iter().map(|hop| hop.program).collect();
    assert_eq!(
        programs,
        vec![
            PathBuf::from("/usr/local/bibutils/bib2xml-static"),
            PathBuf::from("/usr/local/bibutils/xml2ris-static"),
        ]
    );
}

#[tokio::test]
async fn test_reset_location_restores_platform_default() {
    let runner = Arc::new(RecordingRunner::echo());
    let converter = helpers::mock_converter(runner.clone());

    converter.set_binary_path("/custom/path");
    converter.reset_location();

    let location = converter.location();
    assert_eq!(location.suffix, converter.platform().binary_suffix());
    assert!(location.base_dir().ends_with("bibutils"));

    converter
        .convert_str("xml", "end", "<modsCollection/>")
        .await
        .expect("convert");
    let expected = format!("xml2end{}", converter.platform().binary_suffix());
    assert_eq!(runner.program_names(), vec![expected]);
}

#[tokio::test]
async fn test_plan_keeps_its_location_snapshot() {
    let runner = Arc::new(RecordingRunner::echo());
    let converter = helpers::mock_converter(runner.clone());

    let plan = converter
        .plan(&ConversionRequest::new(FormatCode::EndNote, FormatCode::Ris, ""))
        .expect("plan");
    converter.set_binary_path("/elsewhere");

    converter
        .execute_plan(&plan, "%0 Book".into(), CancellationToken::new())
        .await
        .expect("execute");

    for hop in runner.calls() {
        assert!(hop.program.starts_with(helpers::MOCK_DIR));
    }
    assert_eq!(converter.location().base_dir(), PathBuf::from("/elsewhere"));
}

#[tokio::test]
async fn test_location_change_during_conversion_spares_second_hop() {
    let hold = Hold::default();
    let runner = Arc::new(RecordingRunner::echo().holding(hold.clone()));
    let converter = Arc::new(helpers::mock_converter(runner.clone()));

    let in_flight = {
        let converter = Arc::clone(&converter);
        tokio::spawn(async move { converter.convert_str("bib", "ris", "@article{k}").await })
    };

    hold.started.notified().await;
    converter.set_binary_path("/custom/path");
    hold.release.notify_one();

    in_flight.await.expect("join").expect("convert");

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].program, PathBuf::from("/opt/bibutils/bib2xml"));
    assert_eq!(calls[1].program, PathBuf::from("/opt/bibutils/xml2ris"));

    converter
        .convert_str("bib", "xml", "@article{k}")
        .await
        .expect("convert");
    assert_eq!(runner.calls()[2].program, PathBuf::from("/custom/path/bib2xml"));
}

#[tokio::test]
async fn test_cancel_while_hop_is_running() {
    let hold = Hold::default();
    let runner = Arc::new(RecordingRunner::echo().holding(hold.clone()));
    let converter = Arc::new(helpers::mock_converter(runner.clone()));
    let cancel = CancellationToken::new();

    let in_flight = {
        let converter = Arc::clone(&converter);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            converter
                .convert_with_cancel(
                    ConversionRequest::new(FormatCode::Bibtex, FormatCode::Ris, "@article{k}"),
                    cancel,
                )
                .await
        })
    };

    hold.started.notified().await;
    cancel.cancel();

    let err = in_flight.await.expect("join").unwrap_err();
    assert!(matches!(err, bibhub::ConversionError::Cancelled));
    assert_eq!(runner.program_names(), vec!["bib2xml"]);
    assert_eq!(converter.metrics_snapshot().conversions_cancelled, 1);
}
