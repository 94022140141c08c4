use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracker_core::{
    update, Effect, Msg, Notice, OperationHandle, RequestFailure, SolveForm, TrackerPolicy,
    TrackerState, TrackerViewModel,
};

use crate::SolverClient;

/// Receives every notice the tracker produces, together with the view it applies to.
pub trait PresentationSink: Send + Sync {
    fn present(&self, notice: &Notice, view: &TrackerViewModel);
}

/// Forwards notices into a channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<(Notice, TrackerViewModel)>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<(Notice, TrackerViewModel)>) -> Self {
        Self { tx }
    }
}

impl PresentationSink for ChannelSink {
    fn present(&self, notice: &Notice, view: &TrackerViewModel) {
        let _ = self.tx.send((notice.clone(), view.clone()));
    }
}

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub poll_interval: Duration,
    pub policy: TrackerPolicy,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            policy: TrackerPolicy::default(),
        }
    }
}

enum TrackerCommand {
    Dispatch(Msg),
    Shutdown,
}

/// Caller-side handle to a tracker task. All state lives inside the task.
pub struct TrackerHandle {
    cmd_tx: mpsc::UnboundedSender<TrackerCommand>,
    view_rx: watch::Receiver<TrackerViewModel>,
    task: JoinHandle<()>,
}

impl TrackerHandle {
    /// Spawns the tracker task on the current tokio runtime.
    pub fn spawn(
        client: SolverClient,
        settings: TrackerSettings,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let state = TrackerState::with_policy(settings.policy);
        let (view_tx, view_rx) = watch::channel(state.view());

        let tracker = Tracker {
            client,
            sink,
            poll_interval: settings.poll_interval,
            state,
            timer: None,
            reply_tx,
            view_tx,
        };
        let task = tokio::spawn(tracker.run(cmd_rx, reply_rx));

        Self {
            cmd_tx,
            view_rx,
            task,
        }
    }

    pub fn submit(&self, form: SolveForm) {
        self.dispatch(Msg::SubmitRequested(form));
    }

    pub fn attach(&self, handle: OperationHandle) {
        self.dispatch(Msg::Attach(handle));
    }

    pub fn cancel(&self) {
        self.dispatch(Msg::CancelRequested);
    }

    pub fn reset(&self) {
        self.dispatch(Msg::Reset);
    }

    /// Latest published view.
    pub fn view(&self) -> TrackerViewModel {
        self.view_rx.borrow().clone()
    }

    /// Waits until the published view satisfies `predicate`, or the task has stopped.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&TrackerViewModel) -> bool,
    ) -> TrackerViewModel {
        let reached = self
            .view_rx
            .wait_for(predicate)
            .await
            .map(|view| view.clone());
        reached.unwrap_or_else(|_| self.view())
    }

    /// Waits until the tracked operation reaches Done, Canceled or Failed.
    pub async fn settled(&mut self) -> TrackerViewModel {
        self.wait_for(|view| view.lifecycle.is_terminal()).await
    }

    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(TrackerCommand::Shutdown);
        let _ = self.task.await;
    }

    fn dispatch(&self, msg: Msg) {
        let _ = self.cmd_tx.send(TrackerCommand::Dispatch(msg));
    }
}

struct Tracker {
    client: SolverClient,
    sink: Arc<dyn PresentationSink>,
    poll_interval: Duration,
    state: TrackerState,
    timer: Option<Interval>,
    reply_tx: mpsc::UnboundedSender<Msg>,
    view_tx: watch::Sender<TrackerViewModel>,
}

impl Tracker {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<TrackerCommand>,
        mut reply_rx: mpsc::UnboundedReceiver<Msg>,
    ) {
        loop {
            let msg = tokio::select! {
                command = cmd_rx.recv() => match command {
                    Some(TrackerCommand::Dispatch(msg)) => msg,
                    Some(TrackerCommand::Shutdown) | None => break,
                },
                Some(msg) = reply_rx.recv() => msg,
                () = next_tick(&mut self.timer) => Msg::Tick,
            };
            self.dispatch(msg);
        }
        engine_debug!("Tracker loop stopped");
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        // Notices reach the sink before waiters on the view can observe the new state.
        for effect in effects {
            self.run_effect(effect);
        }
        if was_dirty {
            self.view_tx.send_replace(self.state.view());
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::StartTimer => {
                let mut interval =
                    interval_at(Instant::now() + self.poll_interval, self.poll_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.timer = Some(interval);
                engine_debug!("Poll timer started ({:?})", self.poll_interval);
            }
            Effect::StopTimer => {
                self.timer = None;
                engine_debug!("Poll timer stopped");
            }
            Effect::Submit { params } => {
                engine_info!(
                    "Submit input_len={} regex={} min_chars={} parallel={}",
                    params.input.len(),
                    params.regex,
                    params.min_chars,
                    params.parallel_mode
                );
                let client = self.client.clone();
                let reply_tx = self.reply_tx.clone();
                tokio::spawn(async move {
                    let result = client.submit(&params).await.map_err(RequestFailure::from);
                    let _ = reply_tx.send(Msg::SubmitFinished(result));
                });
            }
            Effect::Poll { handle, session } => {
                engine_logging::set_poll_tick(self.state.polls_issued());
                engine_debug!(
                    "Poll #{} for operation {}",
                    engine_logging::poll_tick(),
                    handle
                );
                let client = self.client.clone();
                let reply_tx = self.reply_tx.clone();
                tokio::spawn(async move {
                    let outcome = client.progress(&handle).await;
                    let _ = reply_tx.send(Msg::PollFinished {
                        handle,
                        session,
                        outcome,
                    });
                });
            }
            Effect::Cancel { handle, session } => {
                engine_info!("Cancel requested for operation {}", handle);
                let client = self.client.clone();
                let reply_tx = self.reply_tx.clone();
                tokio::spawn(async move {
                    let result = client
                        .cancel(&handle)
                        .await
                        .map(|_| ())
                        .map_err(RequestFailure::from);
                    let _ = reply_tx.send(Msg::CancelFinished {
                        handle,
                        session,
                        result,
                    });
                });
            }
            Effect::Present(notice) => {
                self.sink.present(&notice, &self.state.view());
            }
        }
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
