//! Per-match state machine feeding engine lines to the turn controller.

use siege_arena::query;
use siege_core::{Command, Event, PlayerSide, UnitStatsTable};
use siege_system_controller::TurnController;
use siege_system_tracker::Tracker;
use tracing::{debug, info};

use crate::protocol::{encode_stack, parse_config, parse_frame, Frame, ProtocolError};

/// What the driver wants written back after consuming a line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Reply {
    /// Nothing to send.
    Idle,
    /// Submit the turn: build stack line, then deploy stack line.
    Submit { build: String, deploy: String },
    /// The engine ended the match.
    Finished,
}

/// Owns the cross-turn state of one match.
#[derive(Debug)]
pub(crate) struct Driver {
    controller: TurnController,
    tracker: Tracker,
    stats: Option<UnitStatsTable>,
}

impl Driver {
    pub(crate) fn new(controller: TurnController) -> Self {
        Self {
            controller,
            tracker: Tracker::default(),
            stats: None,
        }
    }

    /// True once the game configuration has been read.
    pub(crate) fn is_configured(&self) -> bool {
        self.stats.is_some()
    }

    /// Consumes one engine line.
    ///
    /// The first line must be the game configuration; every later line is a
    /// frame.
    pub(crate) fn handle_line(&mut self, line: &str) -> Result<Reply, ProtocolError> {
        let Some(stats) = &self.stats else {
            self.stats = Some(parse_config(line)?);
            info!("game configuration loaded");
            return Ok(Reply::Idle);
        };

        match parse_frame(line, stats)? {
            Frame::Turn(mut arena) => {
                let opponent_mobile = query::balance(&arena, PlayerSide::Enemy).mobile;
                self.tracker.observe_opponent_mobile(opponent_mobile);

                let mut commands: Vec<Command> = Vec::new();
                let outcome = self
                    .controller
                    .handle(&mut arena, &self.tracker, &mut commands);
                debug!(?outcome, ?commands, "controller finished");

                self.tracker.record_turn(
                    query::health(&arena, PlayerSide::Enemy),
                    query::health(&arena, PlayerSide::Ally),
                    opponent_mobile,
                );

                Ok(Reply::Submit {
                    build: encode_stack(query::build_stack(&arena))?,
                    deploy: encode_stack(query::deploy_stack(&arena))?,
                })
            }
            Frame::Action(events) => {
                for event in events {
                    if let Event::Breach {
                        cell,
                        breached: PlayerSide::Ally,
                    } = event
                    {
                        self.tracker.record_breach(cell);
                    }
                }
                Ok(Reply::Idle)
            }
            Frame::GameOver => {
                info!(
                    turns = self.tracker.history().len() - 1,
                    breaches = self.tracker.breaches().len(),
                    "match finished"
                );
                Ok(Reply::Finished)
            }
        }
    }
}
