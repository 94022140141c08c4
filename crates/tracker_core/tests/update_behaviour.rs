use std::sync::Once;

use pretty_assertions::assert_eq;
use tracker_core::{
    update, Effect, LifecycleState, Msg, Notice, OperationHandle, RequestFailure, SolveForm,
    SolveParams, TrackerPolicy, TrackerState, UsageError, ValidationError, DEFAULT_REGEX,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn form(input: &str, regex: &str, min_chars: &str) -> SolveForm {
    SolveForm {
        input: input.to_string(),
        regex: regex.to_string(),
        min_chars: min_chars.to_string(),
        parallel_mode: false,
        credential_digest: None,
    }
}

fn submitted(state: TrackerState, id: &str) -> (TrackerState, Vec<Effect>) {
    let (state, _) = update(state, Msg::SubmitRequested(form("ABCXYZ", "", "3")));
    update(state, Msg::SubmitFinished(Ok(OperationHandle::new(id))))
}

#[test]
fn submit_normalizes_params_and_emits_submit_effect() {
    init_logging();
    let (mut state, effects) = update(
        TrackerState::new(),
        Msg::SubmitRequested(form("ABCXYZ", "", "3")),
    );

    assert_eq!(*state.lifecycle(), LifecycleState::Submitting);
    assert_eq!(
        effects,
        vec![Effect::Submit {
            params: SolveParams {
                input: "ABCXYZ".to_string(),
                regex: DEFAULT_REGEX.to_string(),
                min_chars: 3,
                parallel_mode: false,
                credential_digest: None,
            }
        }]
    );
    assert!(state.consume_dirty());
    assert_eq!(state.view().summary.unwrap().input_chars, 6);
}

#[test]
fn invalid_form_has_no_side_effects() {
    init_logging();
    let state = TrackerState::new();
    let (next, effects) = update(state.clone(), Msg::SubmitRequested(form("", "", "3")));
    assert_eq!(next, state);
    assert_eq!(
        effects,
        vec![Effect::Present(Notice::InvalidParams(
            ValidationError::EmptyInput
        ))]
    );

    let (next, effects) = update(state.clone(), Msg::SubmitRequested(form("AB", "", "x")));
    assert_eq!(next, state);
    assert_eq!(
        effects,
        vec![Effect::Present(Notice::InvalidParams(
            ValidationError::MalformedMinChars("x".to_string())
        ))]
    );
}

#[test]
fn empty_input_is_allowed_when_policy_permits() {
    init_logging();
    let policy = TrackerPolicy {
        require_input: false,
        ..TrackerPolicy::default()
    };
    let (state, effects) = update(
        TrackerState::with_policy(policy),
        Msg::SubmitRequested(form("", "", "")),
    );
    assert_eq!(*state.lifecycle(), LifecycleState::Submitting);
    assert_eq!(effects.len(), 1);
}

#[test]
fn successful_submit_starts_timer_and_stores_handle() {
    init_logging();
    let (state, effects) = submitted(TrackerState::new(), "op-1");

    assert_eq!(*state.lifecycle(), LifecycleState::Running);
    assert_eq!(state.handle(), Some(&OperationHandle::new("op-1")));
    assert!(state.timer_running());
    assert_eq!(
        effects,
        vec![
            Effect::StartTimer,
            Effect::Present(Notice::Submitted(OperationHandle::new("op-1")))
        ]
    );
}

#[test]
fn credential_failure_is_reported_distinctly() {
    init_logging();
    let (state, _) = update(
        TrackerState::new(),
        Msg::SubmitRequested(form("ABC", "", "1")),
    );
    let (state, effects) = update(state, Msg::SubmitFinished(Err(RequestFailure::Credential)));

    assert!(matches!(state.lifecycle(), LifecycleState::Failed(_)));
    assert_eq!(state.handle(), None);
    assert!(!state.timer_running());
    assert_eq!(
        effects,
        vec![Effect::Present(Notice::SubmitFailed(RequestFailure::Credential))]
    );
}

#[test]
fn second_submit_while_active_is_rejected() {
    init_logging();
    let (state, _) = submitted(TrackerState::new(), "op-1");
    let (next, effects) = update(state.clone(), Msg::SubmitRequested(form("XYZ", "", "1")));

    assert_eq!(next, state);
    assert_eq!(
        effects,
        vec![Effect::Present(Notice::Usage(
            UsageError::OperationAlreadyActive
        ))]
    );
}

#[test]
fn cancel_without_handle_is_local_usage_error() {
    init_logging();
    let (_, effects) = update(TrackerState::new(), Msg::CancelRequested);
    assert_eq!(
        effects,
        vec![Effect::Present(Notice::Usage(UsageError::NoActiveOperation))]
    );
}

#[test]
fn cancel_ack_marks_cancel_pending_without_stopping_timer() {
    init_logging();
    let (state, _) = submitted(TrackerState::new(), "op-1");
    let (state, effects) = update(state, Msg::CancelRequested);
    assert_eq!(
        effects,
        vec![Effect::Cancel {
            handle: OperationHandle::new("op-1"),
            session: state.session(),
        }]
    );
    assert_eq!(*state.lifecycle(), LifecycleState::Running);

    let session = state.session();
    let (state, effects) = update(
        state,
        Msg::CancelFinished {
            handle: OperationHandle::new("op-1"),
            session,
            result: Ok(()),
        },
    );
    assert_eq!(*state.lifecycle(), LifecycleState::CancelPending);
    assert!(state.timer_running());
    assert_eq!(effects, vec![Effect::Present(Notice::CancelAccepted)]);

    let (_, effects) = update(state, Msg::CancelRequested);
    assert_eq!(
        effects,
        vec![Effect::Present(Notice::Usage(UsageError::CancelAlreadyPending))]
    );
}

#[test]
fn cancel_failure_leaves_lifecycle_unchanged() {
    init_logging();
    let (state, _) = submitted(TrackerState::new(), "op-1");
    let session = state.session();
    let (state, effects) = update(
        state,
        Msg::CancelFinished {
            handle: OperationHandle::new("op-1"),
            session,
            result: Err(RequestFailure::Status(500)),
        },
    );
    assert_eq!(*state.lifecycle(), LifecycleState::Running);
    assert_eq!(
        effects,
        vec![Effect::Present(Notice::CancelFailed(RequestFailure::Status(
            500
        )))]
    );
    assert!(state.view().last_error.is_some());
}

#[test]
fn attach_tracks_foreign_operation() {
    init_logging();
    let (state, effects) = update(TrackerState::new(), Msg::Attach(OperationHandle::new("op-9")));
    assert_eq!(*state.lifecycle(), LifecycleState::Running);
    assert_eq!(state.view().operation_id.as_deref(), Some("op-9"));
    assert_eq!(
        effects,
        vec![
            Effect::StartTimer,
            Effect::Present(Notice::Attached(OperationHandle::new("op-9")))
        ]
    );
}

#[test]
fn reset_stops_timer_once_and_ignores_late_responses() {
    init_logging();
    let (state, _) = submitted(TrackerState::new(), "op-1");
    let (state, effects) = update(state, Msg::Tick);
    assert_eq!(effects.len(), 1);
    let issued_in = state.session();

    let (state, effects) = update(state, Msg::Reset);
    assert_eq!(effects, vec![Effect::StopTimer]);
    assert_eq!(*state.lifecycle(), LifecycleState::Idle);
    assert_eq!(state.handle(), None);

    let (state, effects) = update(state, Msg::Reset);
    assert!(effects.is_empty());

    let (next, effects) = update(
        state.clone(),
        Msg::PollFinished {
            handle: OperationHandle::new("op-1"),
            session: issued_in,
            outcome: tracker_core::TransportOutcome::Response {
                status: 410,
                body: String::new(),
            },
        },
    );
    assert_eq!(next, state);
    assert!(effects.is_empty());
}

#[test]
fn late_submit_result_after_reset_is_dropped() {
    init_logging();
    let (state, _) = update(
        TrackerState::new(),
        Msg::SubmitRequested(form("ABC", "", "1")),
    );
    let (state, _) = update(state, Msg::Reset);
    let (state, effects) = update(
        state,
        Msg::SubmitFinished(Ok(OperationHandle::new("op-late"))),
    );
    assert!(effects.is_empty());
    assert_eq!(state.handle(), None);
    assert_eq!(*state.lifecycle(), LifecycleState::Idle);
}
