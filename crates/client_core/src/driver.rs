//! Async event loop around [`GameSession`].
//!
//! User commands and internal completions (round-trip replies, pacing timers)
//! are funnelled into one loop, so the session only ever sees one event at a
//! time. Remote calls run on spawned tasks and report back through the
//! internal queue.

use std::sync::Arc;

use shared::domain::{PromotionPiece, Square};
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info};

use crate::{
    config::DriverConfig,
    error::{GestureRejection, SessionOpenError},
    mode::GameSetup,
    rules::Rules,
    session::{Effect, GameSession, GameUpdate, SessionEvent, SessionSnapshot, TimerId},
    MoveService,
};

/// Commands the rendering collaborator may queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Drop { from: Square, to: Square },
    Promote(Option<PromotionPiece>),
    CancelPromotion,
    ResumeAutomated,
}

impl From<UserCommand> for SessionEvent {
    fn from(value: UserCommand) -> Self {
        match value {
            UserCommand::Drop { from, to } => SessionEvent::Drop { from, to },
            UserCommand::Promote(choice) => SessionEvent::PromotionSelected(choice),
            UserCommand::CancelPromotion => SessionEvent::PromotionCancelled,
            UserCommand::ResumeAutomated => SessionEvent::ResumeAutomated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("command queue is full; please retry")]
    Full,
    #[error("game driver stopped")]
    Disconnected,
}

/// UI-side handle to a running game.
pub struct GameHandle<R: Rules> {
    rules: R,
    commands: mpsc::Sender<UserCommand>,
    snapshots: watch::Receiver<SessionSnapshot<R::Position>>,
    updates: mpsc::UnboundedReceiver<GameUpdate>,
}

impl<R: Rules> GameHandle<R> {
    pub fn dispatch(&self, command: UserCommand) -> Result<(), DispatchError> {
        match self.commands.try_send(command) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(DispatchError::Full),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(DispatchError::Disconnected),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot<R::Position> {
        self.snapshots.borrow().clone()
    }

    /// Drag-start veto; answered from the latest snapshot without waiting
    /// on the driver.
    pub fn can_begin_gesture(&self, from: Square) -> Result<(), GestureRejection> {
        self.snapshots.borrow().can_begin_gesture(&self.rules, from)
    }

    pub fn legal_targets(&self, from: Square) -> Vec<Square> {
        self.rules
            .legal_targets(&self.snapshots.borrow().position, from)
    }

    pub async fn next_update(&mut self) -> Option<GameUpdate> {
        self.updates.recv().await
    }

    pub fn try_next_update(&mut self) -> Option<GameUpdate> {
        self.updates.try_recv().ok()
    }

    /// Resolves whenever a new snapshot is published.
    pub async fn changed(&mut self) -> Result<(), DispatchError> {
        self.snapshots
            .changed()
            .await
            .map_err(|_| DispatchError::Disconnected)
    }
}

/// Opens the remote session and starts the driver loop.
///
/// Session-open failure is fatal and returned as is; nothing is retried.
pub async fn start_game<R: Rules>(
    service: Arc<dyn MoveService>,
    rules: R,
    setup: GameSetup,
    config: DriverConfig,
) -> Result<(GameHandle<R>, JoinHandle<()>), SessionOpenError> {
    let session = GameSession::new(setup, rules.clone(), config.automated_move_delay);
    start_session(service, session, rules, config).await
}

/// Like [`start_game`], for a session prepared by the caller.
pub async fn start_session<R: Rules>(
    service: Arc<dyn MoveService>,
    mut session: GameSession<R>,
    rules: R,
    config: DriverConfig,
) -> Result<(GameHandle<R>, JoinHandle<()>), SessionOpenError> {
    let mode = session.mode();
    info!(%mode, "opening game session");
    let session_id = service
        .open_session(session.setup().open_request())
        .await
        .map_err(|err| {
            error!(%mode, error = %err, "failed to open game session");
            SessionOpenError::from(err)
        })?;

    let (command_tx, command_rx) = mpsc::channel(config.command_queue_depth.max(1));
    let (internal_tx, internal_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();

    let opened = session.handle(SessionEvent::Opened(session_id));
    let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

    let mut driver = GameDriver {
        session,
        service,
        commands: command_rx,
        internal_tx,
        internal_rx,
        updates: update_tx,
        snapshots: snapshot_tx,
        timer: None,
    };
    driver.execute(opened);
    let task = tokio::spawn(driver.run());

    let handle = GameHandle {
        rules,
        commands: command_tx,
        snapshots: snapshot_rx,
        updates: update_rx,
    };
    Ok((handle, task))
}

struct GameDriver<R: Rules> {
    session: GameSession<R>,
    service: Arc<dyn MoveService>,
    commands: mpsc::Receiver<UserCommand>,
    internal_tx: mpsc::UnboundedSender<SessionEvent>,
    internal_rx: mpsc::UnboundedReceiver<SessionEvent>,
    updates: mpsc::UnboundedSender<GameUpdate>,
    snapshots: watch::Sender<SessionSnapshot<R::Position>>,
    timer: Option<(TimerId, JoinHandle<()>)>,
}

impl<R: Rules> GameDriver<R> {
    async fn run(mut self) {
        loop {
            let event = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => SessionEvent::from(command),
                    None => break,
                },
                Some(event) = self.internal_rx.recv() => event,
            };
            let effects = self.session.handle(event);
            self.execute(effects);
        }

        if let Some((_, timer)) = self.timer.take() {
            timer.abort();
        }
        debug!(
            session_id = ?self.session.session_id(),
            "game driver stopped"
        );
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(trip) => {
                    let service = Arc::clone(&self.service);
                    let tx = self.internal_tx.clone();
                    tokio::spawn(async move {
                        let result = service.request_move(&trip.session_id, trip.body).await;
                        let _ = tx.send(SessionEvent::MoveReplied {
                            request: trip.request,
                            result,
                        });
                    });
                }
                Effect::ScheduleAutomatedTurn { timer, delay } => {
                    let tx = self.internal_tx.clone();
                    let task = tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(SessionEvent::AutomatedTurnDue(timer));
                    });
                    if let Some((_, previous)) = self.timer.replace((timer, task)) {
                        previous.abort();
                    }
                }
                Effect::Notify(update) => {
                    // A closed receiver only means nobody renders any more.
                    let _ = self.updates.send(update);
                }
            }
        }
        self.snapshots.send_replace(self.session.snapshot());
    }
}

#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod tests;
