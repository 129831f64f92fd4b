//! Game-session state machine.
//!
//! [`GameSession`] owns the position, history and outcome of one game and
//! performs no I/O. Every trigger (a drop, a promotion choice, a remote reply,
//! a timer firing) enters through [`GameSession::handle`] and comes back out
//! as a list of [`Effect`]s for the driver to execute. Exactly one phase holds
//! at a time, and at most one round trip is outstanding.

use std::time::Duration;

use shared::{
    domain::{GameOutcome, MoveDescriptor, PromotionPiece, SessionId, SessionMode, Side, Square},
    protocol::{MoveReply, MoveRequest},
};
use tracing::{debug, info, warn};

use crate::{
    error::{GestureRejection, RoundTripError, ServiceError},
    history::{MoveHistory, MovePair},
    mode::GameSetup,
    rules::{PieceKind, Rules},
    turn_gate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Session not yet opened; the board is locked.
    Initializing,
    /// Waiting for the human side to move, or for an explicit resume.
    Idle,
    SubmittingHumanMove,
    /// Either the pre-request delay is running or the request is in flight.
    AwaitingAutomatedMove,
    PromotionPending,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// A human move between the gesture and its resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub from: Square,
    pub to: Square,
    pub side: Side,
    pub promotion: Option<PromotionPiece>,
}

impl PendingMove {
    pub fn descriptor(&self) -> MoveDescriptor {
        MoveDescriptor {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Opened(SessionId),
    Drop {
        from: Square,
        to: Square,
    },
    /// `None` is the picker's blank entry.
    PromotionSelected(Option<PromotionPiece>),
    PromotionCancelled,
    /// Explicit user request to retry the automated side after a failure.
    ResumeAutomated,
    MoveReplied {
        request: RequestId,
        result: Result<MoveReply, ServiceError>,
    },
    AutomatedTurnDue(TimerId),
}

/// One outbound move request.
#[derive(Debug, Clone)]
pub struct RoundTrip {
    pub request: RequestId,
    pub session_id: SessionId,
    pub body: MoveRequest,
}

/// Notifications for the rendering collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum GameUpdate {
    Ready {
        mode: SessionMode,
    },
    HumanTurn {
        side: Side,
    },
    Thinking {
        side: Side,
    },
    Snapback {
        from: Square,
        to: Square,
    },
    Rejected(GestureRejection),
    PromotionRequested {
        from: Square,
        to: Square,
        side: Side,
    },
    PromotionDismissed,
    MoveApplied {
        san: String,
        fen: String,
        pairs: Vec<MovePair>,
    },
    GameOver(GameOutcome),
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum Effect {
    Send(RoundTrip),
    ScheduleAutomatedTurn { timer: TimerId, delay: Duration },
    Notify(GameUpdate),
}

/// Read-only view published after every transition.
#[derive(Debug, Clone)]
pub struct SessionSnapshot<P> {
    pub phase: Phase,
    pub mode: SessionMode,
    pub session_id: Option<SessionId>,
    pub position: P,
    pub fen: String,
    pub side_to_move: Side,
    pub history: MoveHistory,
    pub outcome: GameOutcome,
    pub pending: Option<PendingMove>,
}

impl<P> SessionSnapshot<P> {
    pub fn can_begin_gesture<R>(&self, rules: &R, from: Square) -> Result<(), GestureRejection>
    where
        R: Rules<Position = P>,
    {
        turn_gate::check_gesture(rules, self.phase, self.mode, self.outcome, &self.position, from)
    }
}

struct AppliedReply<P> {
    position: P,
    san: String,
    outcome: GameOutcome,
}

pub struct GameSession<R: Rules> {
    setup: GameSetup,
    rules: R,
    session_id: Option<SessionId>,
    phase: Phase,
    position: R::Position,
    history: MoveHistory,
    outcome: GameOutcome,
    pending: Option<PendingMove>,
    in_flight: Option<RequestId>,
    armed_timer: Option<TimerId>,
    next_id: u64,
    automated_delay: Duration,
}

impl<R: Rules> GameSession<R> {
    pub fn new(setup: GameSetup, rules: R, automated_delay: Duration) -> Self {
        let position = rules.initial_position();
        Self::from_position(setup, rules, position, automated_delay)
    }

    pub fn from_position(
        setup: GameSetup,
        rules: R,
        position: R::Position,
        automated_delay: Duration,
    ) -> Self {
        Self {
            setup,
            rules,
            session_id: None,
            phase: Phase::Initializing,
            position,
            history: MoveHistory::default(),
            outcome: GameOutcome::Ongoing,
            pending: None,
            in_flight: None,
            armed_timer: None,
            next_id: 0,
            automated_delay,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> SessionMode {
        self.setup.mode
    }

    pub fn setup(&self) -> &GameSetup {
        &self.setup
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn position(&self) -> &R::Position {
        &self.position
    }

    pub fn fen(&self) -> String {
        self.rules.notation(&self.position)
    }

    pub fn side_to_move(&self) -> Side {
        self.rules.side_to_move(&self.position)
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn outcome(&self) -> GameOutcome {
        self.outcome
    }

    pub fn pending_move(&self) -> Option<&PendingMove> {
        self.pending.as_ref()
    }

    pub fn request_in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    pub fn armed_timer(&self) -> Option<TimerId> {
        self.armed_timer
    }

    pub fn is_human_turn(&self) -> bool {
        turn_gate::is_human_turn(self.setup.mode, self.side_to_move())
    }

    pub fn can_begin_gesture(&self, from: Square) -> Result<(), GestureRejection> {
        turn_gate::check_gesture(
            &self.rules,
            self.phase,
            self.setup.mode,
            self.outcome,
            &self.position,
            from,
        )
    }

    pub fn legal_targets(&self, from: Square) -> Vec<Square> {
        self.rules.legal_targets(&self.position, from)
    }

    pub fn snapshot(&self) -> SessionSnapshot<R::Position> {
        SessionSnapshot {
            phase: self.phase,
            mode: self.setup.mode,
            session_id: self.session_id.clone(),
            position: self.position.clone(),
            fen: self.fen(),
            side_to_move: self.side_to_move(),
            history: self.history.clone(),
            outcome: self.outcome,
            pending: self.pending,
        }
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Opened(session_id) => self.on_opened(session_id),
            SessionEvent::Drop { from, to } => self.on_drop(from, to),
            SessionEvent::PromotionSelected(choice) => self.on_promotion_selected(choice),
            SessionEvent::PromotionCancelled => self.on_promotion_cancelled(),
            SessionEvent::ResumeAutomated => self.on_resume_automated(),
            SessionEvent::MoveReplied { request, result } => self.on_move_replied(request, result),
            SessionEvent::AutomatedTurnDue(timer) => self.on_automated_turn_due(timer),
        }
    }

    fn on_opened(&mut self, session_id: SessionId) -> Vec<Effect> {
        if self.phase != Phase::Initializing {
            warn!(%session_id, phase = ?self.phase, "ignoring second session open");
            return Vec::new();
        }
        info!(%session_id, mode = %self.setup.mode, "game session opened");
        self.session_id = Some(session_id);
        self.set_phase(Phase::Idle);

        let mut effects = vec![Effect::Notify(GameUpdate::Ready {
            mode: self.setup.mode,
        })];
        let side = self.side_to_move();
        if self.is_human_turn() {
            effects.push(Effect::Notify(GameUpdate::HumanTurn { side }));
        } else {
            // The opening automated move goes out without the pacing delay.
            effects.extend(self.request_automated_move());
        }
        effects
    }

    fn on_drop(&mut self, from: Square, to: Square) -> Vec<Effect> {
        if let Err(rejection) = self.can_begin_gesture(from) {
            debug!(%from, %to, %rejection, "drop rejected by turn gate");
            return vec![
                Effect::Notify(GameUpdate::Snapback { from, to }),
                Effect::Notify(GameUpdate::Rejected(rejection)),
            ];
        }

        let side = self.side_to_move();
        let pending = PendingMove {
            from,
            to,
            side,
            promotion: None,
        };
        let is_pawn = self
            .rules
            .piece_at(&self.position, from)
            .is_some_and(|piece| piece.kind == PieceKind::Pawn);

        if is_pawn && to.is_back_rank() {
            self.pending = Some(pending);
            self.set_phase(Phase::PromotionPending);
            return vec![Effect::Notify(GameUpdate::PromotionRequested { from, to, side })];
        }

        self.submit_human_move(pending)
    }

    fn on_promotion_selected(&mut self, choice: Option<PromotionPiece>) -> Vec<Effect> {
        if self.phase != Phase::PromotionPending {
            debug!(phase = ?self.phase, "promotion choice outside promotion phase ignored");
            return Vec::new();
        }
        let Some(piece) = choice else {
            return Vec::new();
        };
        let Some(mut pending) = self.pending.take() else {
            warn!("promotion phase without a pending move");
            self.set_phase(Phase::Idle);
            return vec![Effect::Notify(GameUpdate::PromotionDismissed)];
        };

        pending.promotion = Some(piece);
        let mut effects = vec![Effect::Notify(GameUpdate::PromotionDismissed)];
        effects.extend(self.submit_human_move(pending));
        effects
    }

    fn on_promotion_cancelled(&mut self) -> Vec<Effect> {
        if self.phase != Phase::PromotionPending {
            return Vec::new();
        }
        self.set_phase(Phase::Idle);
        let mut effects = vec![Effect::Notify(GameUpdate::PromotionDismissed)];
        if let Some(pending) = self.pending.take() {
            effects.push(Effect::Notify(GameUpdate::Snapback {
                from: pending.from,
                to: pending.to,
            }));
        }
        effects
    }

    fn on_resume_automated(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Idle || self.outcome.is_terminal() || self.is_human_turn() {
            debug!(phase = ?self.phase, "resume request ignored");
            return Vec::new();
        }
        info!(side = %self.side_to_move(), "resuming automated move on request");
        self.request_automated_move()
    }

    fn on_automated_turn_due(&mut self, timer: TimerId) -> Vec<Effect> {
        if self.armed_timer != Some(timer) || self.phase != Phase::AwaitingAutomatedMove {
            debug!(timer = timer.0, phase = ?self.phase, "stale automated turn timer ignored");
            return Vec::new();
        }
        self.armed_timer = None;
        self.request_automated_move()
    }

    fn on_move_replied(
        &mut self,
        request: RequestId,
        result: Result<MoveReply, ServiceError>,
    ) -> Vec<Effect> {
        if self.in_flight != Some(request) {
            debug!(
                request = request.0,
                phase = ?self.phase,
                "reply for a request that is not in flight ignored"
            );
            return Vec::new();
        }
        self.in_flight = None;

        let human = match self.phase {
            Phase::SubmittingHumanMove => true,
            Phase::AwaitingAutomatedMove => false,
            other => {
                warn!(phase = ?other, request = request.0, "reply arrived in unexpected phase");
                return Vec::new();
            }
        };

        match result
            .map_err(RoundTripError::from)
            .and_then(|reply| self.reconcile(reply))
        {
            Ok(applied) => self.commit(applied),
            Err(error) => self.fail_round_trip(human, error),
        }
    }

    /// Replays the service's move locally and checks it lands on the
    /// position the service reported.
    fn reconcile(&self, reply: MoveReply) -> Result<AppliedReply<R::Position>, RoundTripError> {
        let applied = self
            .rules
            .apply_move(&self.position, &reply.applied_move)
            .ok_or(RoundTripError::IllegalMove(reply.applied_move))?;

        let expected = self.rules.notation(&applied.position);
        if !same_placement_and_turn(&expected, &reply.position) {
            return Err(RoundTripError::Desync {
                applied: reply.applied_move,
                expected,
                reported: reply.position,
            });
        }

        Ok(AppliedReply {
            position: applied.position,
            san: applied.san,
            outcome: reply.outcome(),
        })
    }

    fn commit(&mut self, applied: AppliedReply<R::Position>) -> Vec<Effect> {
        self.position = applied.position;
        self.history.push(applied.san.clone());
        self.pending = None;

        debug!(
            san = %applied.san,
            ply = self.history.len(),
            "move applied"
        );
        let mut effects = vec![Effect::Notify(GameUpdate::MoveApplied {
            san: applied.san,
            fen: self.fen(),
            pairs: self.history.pairs(),
        })];

        if applied.outcome.is_terminal() {
            effects.extend(self.terminate(applied.outcome));
            return effects;
        }

        let side = self.side_to_move();
        if self.is_human_turn() {
            self.set_phase(Phase::Idle);
            effects.push(Effect::Notify(GameUpdate::HumanTurn { side }));
        } else {
            self.set_phase(Phase::AwaitingAutomatedMove);
            let timer = TimerId(self.next_id());
            self.armed_timer = Some(timer);
            effects.push(Effect::Notify(GameUpdate::Thinking { side }));
            effects.push(Effect::ScheduleAutomatedTurn {
                timer,
                delay: self.automated_delay,
            });
        }
        effects
    }

    fn fail_round_trip(&mut self, human: bool, error: RoundTripError) -> Vec<Effect> {
        warn!(%error, human, "round trip failed; no automatic retry");
        self.set_phase(Phase::Idle);

        let mut effects = Vec::new();
        if let Some(pending) = self.pending.take() {
            effects.push(Effect::Notify(GameUpdate::Snapback {
                from: pending.from,
                to: pending.to,
            }));
        }
        effects.push(Effect::Notify(GameUpdate::Failed(error.to_string())));
        if human {
            effects.push(Effect::Notify(GameUpdate::HumanTurn {
                side: self.side_to_move(),
            }));
        }
        effects
    }

    fn terminate(&mut self, outcome: GameOutcome) -> Vec<Effect> {
        info!(
            %outcome,
            plies = self.history.len(),
            session_id = ?self.session_id,
            "game over"
        );
        self.outcome = outcome;
        self.pending = None;
        self.set_phase(Phase::Terminal);

        vec![Effect::Notify(GameUpdate::GameOver(outcome))]
    }

    fn submit_human_move(&mut self, pending: PendingMove) -> Vec<Effect> {
        let descriptor = pending.descriptor();
        if self.rules.apply_move(&self.position, &descriptor).is_none() {
            self.pending = None;
            self.set_phase(Phase::Idle);
            let error = RoundTripError::IllegalMove(descriptor);
            debug!(%error, "human move refused locally");
            return vec![
                Effect::Notify(GameUpdate::Snapback {
                    from: pending.from,
                    to: pending.to,
                }),
                Effect::Notify(GameUpdate::Failed(error.to_string())),
            ];
        }

        let Some(send) = self.send(pending.side, Some(descriptor)) else {
            self.pending = None;
            self.set_phase(Phase::Idle);
            return vec![Effect::Notify(GameUpdate::Snapback {
                from: pending.from,
                to: pending.to,
            })];
        };
        self.pending = Some(pending);
        self.set_phase(Phase::SubmittingHumanMove);
        vec![send]
    }

    fn request_automated_move(&mut self) -> Vec<Effect> {
        let side = self.side_to_move();
        let Some(send) = self.send(side, None) else {
            self.set_phase(Phase::Idle);
            return Vec::new();
        };
        // The pacing delay already announced this turn.
        let announce = self.phase != Phase::AwaitingAutomatedMove;
        self.set_phase(Phase::AwaitingAutomatedMove);

        let mut effects = Vec::with_capacity(2);
        if announce {
            effects.push(Effect::Notify(GameUpdate::Thinking { side }));
        }
        effects.push(send);
        effects
    }

    fn send(&mut self, side: Side, descriptor: Option<MoveDescriptor>) -> Option<Effect> {
        let Some(session_id) = self.session_id.clone() else {
            warn!("round trip requested before the session opened");
            return None;
        };
        if let Some(outstanding) = self.in_flight {
            warn!(
                outstanding = outstanding.0,
                "round trip requested while another is outstanding"
            );
            return None;
        }

        let request = RequestId(self.next_id());
        self.in_flight = Some(request);
        debug!(
            request = request.0,
            %session_id,
            %side,
            human = descriptor.is_some(),
            "issuing round trip"
        );
        Some(Effect::Send(RoundTrip {
            request,
            session_id,
            body: MoveRequest { side, descriptor },
        }))
    }

    fn set_phase(&mut self, next: Phase) {
        if self.phase != next {
            debug!(from = ?self.phase, to = ?next, "session phase transition");
        }
        self.phase = next;
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Compares the piece placement and side-to-move fields of two FEN strings.
fn same_placement_and_turn(local: &str, reported: &str) -> bool {
    local
        .split_whitespace()
        .take(2)
        .eq(reported.split_whitespace().take(2))
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
