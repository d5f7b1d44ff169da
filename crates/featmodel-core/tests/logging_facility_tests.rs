#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{feature_including, feature_with_modules, upgrade_of};
use featmodel_core::assembly::{
    assemble, assemble_application, assemble_with_upgrades, BuilderContext, MapFeatureProvider,
};
use featmodel_core::diff::{compute_diff, diff, DiffRequest, SectionFilter};
use featmodel_core::errors::{ExErrorKind, FeatureError};
use featmodel_core::featmodel_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_DURATION_MS, FIELD_ERR_CODE, FIELD_FEATURE_ID,
    FIELD_REQUEST_ID, FIELD_TRACE_ID,
};
use featmodel_core::featmodel_core_types::{RequestContext, RequestId, TraceId};
use featmodel_core::model::{Extension, ExtensionKind};
use featmodel_core::logging_facility::test_capture::init_test_capture;
use featmodel_core::{log_op_end, log_op_error, log_op_start};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, feature_id = "g:a:1.0.0");

    let start_events = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name)
            && e.event.as_deref() == Some(EVENT_START)
            && e.field(FIELD_FEATURE_ID) == Some("g:a:1.0.0")
    });
    assert_eq!(start_events, 1, "Should have exactly one start event");
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1, "Should have exactly one end event");
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[0].field(FIELD_DURATION_MS), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = FeatureError::UnresolvedInclude {
        id: "g:a:1.0.0".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1, "Should have exactly one error event");
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(events[0].field(FIELD_ERR_CODE), Some("ERR_UNRESOLVED_INCLUDE"));
}

#[test]
fn test_assemble_emits_start_and_end() {
    let capture = init_test_capture();
    let base = feature_with_modules("org.logging.assemble:base:1.0.0", &["g:m:1.0.0"]);
    let app = feature_including(
        "org.logging.assemble:app:1.0.0",
        &["org.logging.assemble:base:1.0.0"],
    );
    let provider = MapFeatureProvider::new().with_feature(base);
    let request_id = RequestId::from_string("req-assemble-1".to_string());
    let context = BuilderContext::new(&provider)
        .with_request_context(RequestContext::with_request_id(request_id));

    assemble(&app, &context).unwrap();

    let events: Vec<_> = capture
        .events_for_op("assemble")
        .into_iter()
        .filter(|e| e.field(FIELD_FEATURE_ID) == Some("org.logging.assemble:app:1.0.0"))
        .collect();
    let kinds: Vec<_> = events.iter().filter_map(|e| e.event.as_deref()).collect();
    assert_eq!(kinds, vec![EVENT_START, EVENT_END]);
    assert_eq!(events[0].field(FIELD_REQUEST_ID), Some("req-assemble-1"));

    let include_events = capture.count_events(|e| {
        e.field("include_id") == Some("org.logging.assemble:base:1.0.0")
    });
    assert_eq!(include_events, 1);
}

#[test]
fn test_assemble_failure_emits_end_error() {
    let capture = init_test_capture();
    let app = feature_including(
        "org.logging.failure:app:1.0.0",
        &["org.logging.failure:missing:1.0.0"],
    );
    let provider = MapFeatureProvider::new();

    assemble(&app, &BuilderContext::new(&provider)).unwrap_err();

    let errors = capture.count_events(|e| {
        e.op.as_deref() == Some("assemble")
            && e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.field(FIELD_FEATURE_ID) == Some("org.logging.failure:app:1.0.0")
    });
    assert_eq!(errors, 1);
    let ends = capture.count_events(|e| {
        e.op.as_deref() == Some("assemble")
            && e.event.as_deref() == Some(EVENT_END)
            && e.field(FIELD_FEATURE_ID) == Some("org.logging.failure:app:1.0.0")
    });
    assert_eq!(ends, 0);
}

#[test]
fn test_diff_emits_start_and_end() {
    let capture = init_test_capture();
    let previous = feature_with_modules("org.logging.diff:f:1.0.0", &["g:m:1.0.0"]);
    let current = feature_with_modules("org.logging.diff:f:2.0.0", &["g:m:2.0.0"]);

    diff(&previous, &current, SectionFilter::all()).unwrap();

    let starts = capture.count_events(|e| {
        e.op.as_deref() == Some("compute_diff")
            && e.event.as_deref() == Some(EVENT_START)
            && e.field(FIELD_FEATURE_ID) == Some("org.logging.diff:f:2.0.0")
    });
    assert_eq!(starts, 1);
    capture.assert_event_exists("compute_diff", EVENT_END);
}

#[test]
fn test_discarded_upgrade_is_logged() {
    let capture = init_test_capture();
    let base = feature_with_modules("org.logging.upgrade:base:1.0.0", &["g:m:1.0.0"]);
    let older = upgrade_of("org.logging.upgrade:fix:1.0", "org.logging.upgrade:base:1.0.0");
    let newer = upgrade_of("org.logging.upgrade:fix:1.1", "org.logging.upgrade:base:1.0.0");
    let provider = MapFeatureProvider::new();

    assemble_with_upgrades(&base, &[older, newer], &BuilderContext::new(&provider)).unwrap();

    let discarded = capture.count_events(|e| {
        e.field("discarded") == Some("org.logging.upgrade:fix:1.0")
            && e.field("kept") == Some("org.logging.upgrade:fix:1.1")
    });
    assert_eq!(discarded, 1);
    capture.assert_event_exists("assemble_with_upgrades", EVENT_END);
}

#[test]
fn test_application_emits_start_and_end() {
    let capture = init_test_capture();
    let a = feature_with_modules("org.logging.app:a:1.0.0", &["g:m:1.0.0"]);
    let provider = MapFeatureProvider::new();

    assemble_application(&[a], &BuilderContext::new(&provider)).unwrap();

    capture.assert_event_exists("assemble_application", EVENT_START);
    capture.assert_event_exists("assemble_application", EVENT_END);
}

#[test]
fn test_assemble_failure_carries_correlation_ids() {
    let capture = init_test_capture();
    let app = feature_including(
        "org.logging.correlation:app:1.0.0",
        &["org.logging.correlation:missing:1.0.0"],
    );
    let provider = MapFeatureProvider::new();
    let request = RequestContext::with_request_id(RequestId::from_string("req-corr-1".to_string()))
        .with_trace_id(TraceId::from_string("release-corr-1".to_string()));
    let context = BuilderContext::new(&provider).with_request_context(request);

    assemble(&app, &context).unwrap_err();

    let errors: Vec<_> = capture
        .events_for_op("assemble")
        .into_iter()
        .filter(|e| {
            e.event.as_deref() == Some(EVENT_END_ERROR)
                && e.field(FIELD_FEATURE_ID) == Some("org.logging.correlation:app:1.0.0")
        })
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field(FIELD_REQUEST_ID), Some("req-corr-1"));
    assert_eq!(errors[0].field(FIELD_TRACE_ID), Some("release-corr-1"));
}

#[test]
fn test_diff_error_carries_correlation_ids() {
    let capture = init_test_capture();
    let mut previous = feature_with_modules("org.logging.diff-error:f:1.0.0", &[]);
    previous
        .extensions
        .add(Extension::json("api-regions", ExtensionKind::Optional, "{"));
    let mut current = feature_with_modules("org.logging.diff-error:f:2.0.0", &[]);
    current
        .extensions
        .add(Extension::json("api-regions", ExtensionKind::Optional, "{}"));
    let request_id = RequestId::from_string("req-diff-err".to_string());
    let trace_id = TraceId::from_string("release-diff-err".to_string());
    let request = DiffRequest::new(&previous, &current, SectionFilter::all()).with_request_context(
        RequestContext::with_request_id(request_id.clone()).with_trace_id(trace_id.clone()),
    );

    let err = compute_diff(&request).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::MalformedExtension);
    assert_eq!(err.request_id(), Some(&request_id));
    assert_eq!(err.trace_id(), Some(&trace_id));
    let logged = capture.count_events(|e| {
        e.op.as_deref() == Some("compute_diff")
            && e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.field(FIELD_REQUEST_ID) == Some("req-diff-err")
            && e.field(FIELD_TRACE_ID) == Some("release-diff-err")
    });
    assert_eq!(logged, 1);
}
