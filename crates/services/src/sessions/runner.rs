use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use storage::repository::StorageNotice;

use super::service::TestSetSession;
use super::view::SessionSnapshot;
use super::workflow::TestSetTakingService;
use crate::sync::SyncTrigger;
use crate::timer::TICK_INTERVAL;

/// Input forwarded from the page to its runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerCommand {
    FocusRegained,
    VisibilityChanged { visible: bool },
    SubmitClicked,
    Stop,
}

/// Owner side of a running page. Dropping it stops the runner.
pub struct RunnerHandle {
    commands: mpsc::UnboundedSender<RunnerCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<()>,
}

impl RunnerHandle {
    /// Returns `false` once the runner has stopped.
    pub fn send(&self, command: RunnerCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Command sender that can be moved into UI callbacks.
    #[must_use]
    pub fn commands(&self) -> mpsc::UnboundedSender<RunnerCommand> {
        self.commands.clone()
    }

    #[must_use]
    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    #[must_use]
    pub fn latest(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the runner and waits for it to wind down.
    pub async fn stop(self) -> SessionSnapshot {
        let _ = self.commands.send(RunnerCommand::Stop);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "session runner ended abnormally");
        }
        self.snapshots.borrow().clone()
    }
}

/// Event loop of one open taking page: countdown ticks, cross-context
/// changes and page commands, one at a time.
pub struct SessionRunner {
    service: Arc<TestSetTakingService>,
    session: TestSetSession,
    tick_every: Duration,
}

impl SessionRunner {
    #[must_use]
    pub fn new(service: Arc<TestSetTakingService>, session: TestSetSession) -> Self {
        Self {
            service,
            session,
            tick_every: TICK_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_tick_interval(mut self, tick_every: Duration) -> Self {
        self.tick_every = tick_every;
        self
    }

    /// Spawns the loop on the current tokio runtime.
    #[must_use]
    pub fn spawn(self) -> RunnerHandle {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) =
            watch::channel(self.session.snapshot(self.service.now_ms()));
        let task = tokio::spawn(self.run(command_rx, snapshot_tx));
        RunnerHandle {
            commands,
            snapshots,
            task,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<RunnerCommand>,
        snapshots: watch::Sender<SessionSnapshot>,
    ) {
        let submission_id = self.session.submission_id().clone();
        if self.session.phase().is_terminal() {
            tracing::debug!(submission = %submission_id, phase = ?self.session.phase(), "runner not started");
            return;
        }

        let mut changes = self.service.sync_source(&submission_id).subscribe();
        let mut changes_open = true;
        let mut ticker = tokio::time::interval(self.tick_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(submission = %submission_id, "session runner started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = self.service.tick(&mut self.session).await;
                    if outcome.submit_due {
                        // Failure is logged and reflected in the phase; no retry.
                        let _ = self.service.submit_final(&mut self.session).await;
                    }
                }
                notice = changes.recv(), if changes_open => match notice {
                    Some(StorageNotice::Changed(event)) => {
                        let trigger = SyncTrigger::StorageEvent { new_value: event.new_value };
                        self.service.sync(&mut self.session, trigger).await;
                    }
                    Some(StorageNotice::Missed(_)) => {
                        self.service.sync(&mut self.session, SyncTrigger::Lagged).await;
                    }
                    None => changes_open = false,
                },
                command = commands.recv() => match command {
                    Some(RunnerCommand::FocusRegained) => {
                        self.service.sync(&mut self.session, SyncTrigger::FocusRegained).await;
                    }
                    Some(RunnerCommand::VisibilityChanged { visible: true }) => {
                        self.service.sync(&mut self.session, SyncTrigger::VisibilityRegained).await;
                    }
                    Some(RunnerCommand::VisibilityChanged { visible: false }) => {}
                    Some(RunnerCommand::SubmitClicked) => {
                        if let Ok(false) = self.service.submit_clicked(&mut self.session).await {
                            tracing::debug!(submission = %submission_id, "submit click ignored");
                        }
                    }
                    Some(RunnerCommand::Stop) | None => break,
                },
            }

            snapshots.send_replace(self.session.snapshot(self.service.now_ms()));
            if self.session.phase().is_terminal() {
                break;
            }
        }

        tracing::info!(submission = %submission_id, phase = ?self.session.phase(), "session runner stopped");
    }
}
