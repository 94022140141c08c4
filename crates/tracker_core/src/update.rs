use crate::{
    classify, Effect, ErrorPolicy, LifecycleEvent, LifecycleState, Msg, Notice, TrackerState,
    UsageError,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitRequested(form) => {
            if state.lifecycle().is_active() {
                return (state, vec![usage(UsageError::OperationAlreadyActive)]);
            }
            match form.validate(state.policy().require_input) {
                Ok(params) => {
                    state.begin_submit(params.clone());
                    vec![Effect::Submit { params }]
                }
                Err(err) => vec![Effect::Present(Notice::InvalidParams(err))],
            }
        }
        Msg::SubmitFinished(result) => {
            // A reset while the call was outstanding leaves nothing to attach it to.
            if *state.lifecycle() != LifecycleState::Submitting {
                return (state, Vec::new());
            }
            match result {
                Ok(handle) => {
                    state.activate(handle.clone());
                    vec![Effect::StartTimer, Effect::Present(Notice::Submitted(handle))]
                }
                Err(failure) => {
                    state.fail_submit(failure.to_string());
                    vec![Effect::Present(Notice::SubmitFailed(failure))]
                }
            }
        }
        Msg::Attach(handle) => {
            if state.lifecycle().is_active() {
                return (state, vec![usage(UsageError::OperationAlreadyActive)]);
            }
            state.begin_attach();
            state.activate(handle.clone());
            vec![Effect::StartTimer, Effect::Present(Notice::Attached(handle))]
        }
        Msg::Tick => match state.begin_poll() {
            Some(handle) => vec![Effect::Poll {
                handle,
                session: state.session(),
            }],
            None => Vec::new(),
        },
        Msg::PollFinished {
            handle,
            session,
            outcome,
        } => {
            if !state.is_current(&handle, session) {
                return (state, Vec::new());
            }
            state.end_poll();
            apply_event(&mut state, classify(&outcome))
        }
        Msg::CancelRequested => match state.lifecycle() {
            LifecycleState::CancelPending => vec![usage(UsageError::CancelAlreadyPending)],
            _ => match state.handle() {
                Some(handle) => vec![Effect::Cancel {
                    handle: handle.clone(),
                    session: state.session(),
                }],
                None => vec![usage(UsageError::NoActiveOperation)],
            },
        },
        Msg::CancelFinished {
            handle,
            session,
            result,
        } => {
            if !state.is_current(&handle, session) {
                return (state, Vec::new());
            }
            match result {
                Ok(()) => {
                    state.mark_cancel_pending();
                    vec![Effect::Present(Notice::CancelAccepted)]
                }
                Err(failure) => {
                    state.record_error(failure.to_string());
                    vec![Effect::Present(Notice::CancelFailed(failure))]
                }
            }
        }
        Msg::Reset => {
            if state.reset() {
                vec![Effect::StopTimer]
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}

fn apply_event(state: &mut TrackerState, event: LifecycleEvent) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    match &event {
        LifecycleEvent::Progress(report) => {
            state.apply_snapshot(report.snapshot.clone(), report.params.clone());
        }
        LifecycleEvent::Completed(report) => {
            if state.finish(LifecycleState::Done) {
                effects.push(Effect::StopTimer);
            }
            state.apply_snapshot(report.snapshot.clone(), report.params.clone());
        }
        LifecycleEvent::CancelPending => state.mark_cancel_pending(),
        LifecycleEvent::Canceled => {
            if state.finish(LifecycleState::Canceled) {
                effects.push(Effect::StopTimer);
            }
        }
        LifecycleEvent::CredentialError | LifecycleEvent::TransportError { .. } => {
            let reason = event.error_reason().unwrap_or_default();
            state.record_error(reason.clone());
            if state.policy().on_transport_error == ErrorPolicy::Halt
                && state.finish(LifecycleState::Failed(reason))
            {
                effects.push(Effect::StopTimer);
            }
        }
    }
    effects.push(Effect::Present(Notice::Lifecycle(event)));
    effects
}

fn usage(err: UsageError) -> Effect {
    Effect::Present(Notice::Usage(err))
}
