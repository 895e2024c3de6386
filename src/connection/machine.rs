//! Connection lifecycle as a pure transition function.
//!
//! `Machine::transition` takes the current machine and one event and returns
//! the next machine plus the effects the caller must carry out. It never
//! touches a socket or a clock, so every lifecycle rule can be checked with
//! plain unit tests.

use std::time::Duration;

use super::state::{ConnectionState, StatusUpdate};

/// Where the connection lifecycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing attempted yet.
    Idle,
    Connecting,
    Connected,
    /// The transport closed the socket. Unclean closes have a reconnect
    /// pending; clean closes are terminal.
    Closed { clean: bool },
    /// The socket could not even be constructed. No retry is scheduled.
    ConstructionFailed,
}

impl Phase {
    pub fn connection_state(&self) -> ConnectionState {
        match self {
            Phase::Connecting => ConnectionState::Connecting,
            Phase::Connected => ConnectionState::Connected,
            Phase::Idle | Phase::Closed { .. } | Phase::ConstructionFailed => {
                ConnectionState::Disconnected
            }
        }
    }

    /// A socket object exists (open or still opening).
    pub fn socket_live(&self) -> bool {
        matches!(self, Phase::Connecting | Phase::Connected)
    }
}

/// Inputs to the machine. Transport events carry the generation of the
/// socket that produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ConnectRequested,
    DisconnectRequested,
    SendRequested,
    ReconnectTimerFired { timer: u64 },
    ConstructionFailed { generation: u64, reason: String },
    Opened { generation: u64 },
    MessageReceived { generation: u64, text: String },
    TransportError { generation: u64, reason: String },
    Closed {
        generation: u64,
        code: u16,
        reason: String,
        clean: bool,
    },
}

impl Event {
    fn generation(&self) -> Option<u64> {
        match self {
            Event::ConstructionFailed { generation, .. }
            | Event::Opened { generation }
            | Event::MessageReceived { generation, .. }
            | Event::TransportError { generation, .. }
            | Event::Closed { generation, .. } => Some(*generation),
            _ => None,
        }
    }
}

/// Work the caller performs after a transition, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CancelReconnect { timer: u64 },
    OpenSocket { generation: u64 },
    CloseSocket { generation: u64 },
    ReleaseSocket { generation: u64 },
    ScheduleReconnect { timer: u64, delay: Duration },
    SendParameters,
    DeliverMessage { text: String },
    SetStatus(StatusUpdate),
    /// Observational only: the manager logs these.
    Report(Report),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    AlreadyConnecting,
    NotConnected,
    StaleEvent { generation: u64, current: u64 },
    StaleTimer { timer: u64 },
    ConstructionFailed { reason: String },
    TransportError { reason: String },
    Closed { code: u16, reason: String, clean: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Machine {
    phase: Phase,
    generation: u64,
    pending_timer: Option<u64>,
    next_timer: u64,
    reconnect_delay: Duration,
}

impl Machine {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            generation: 0,
            pending_timer: None,
            next_timer: 0,
            reconnect_delay,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> ConnectionState {
        self.phase.connection_state()
    }

    /// Generation of the most recent connection attempt (0 before the first).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn transition(self, event: &Event) -> (Machine, Vec<Effect>) {
        let mut next = self;
        let mut effects = Vec::new();

        if let Some(generation) = event.generation() {
            if generation != self.generation {
                effects.push(Effect::Report(Report::StaleEvent {
                    generation,
                    current: self.generation,
                }));
                return (next, effects);
            }
        }

        match event {
            Event::ConnectRequested => next.connect(&mut effects),

            Event::ReconnectTimerFired { timer } => {
                if self.pending_timer == Some(*timer) {
                    next.pending_timer = None;
                    next.connect(&mut effects);
                } else {
                    effects.push(Effect::Report(Report::StaleTimer { timer: *timer }));
                }
            }

            Event::DisconnectRequested => {
                next.cancel_timer(&mut effects);
                if self.phase.socket_live() {
                    effects.push(Effect::CloseSocket {
                        generation: self.generation,
                    });
                }
            }

            Event::SendRequested => {
                if self.phase == Phase::Connected {
                    effects.push(Effect::SendParameters);
                } else {
                    effects.push(Effect::Report(Report::NotConnected));
                }
            }

            Event::ConstructionFailed { reason, .. } => {
                if self.phase == Phase::Connecting {
                    next.phase = Phase::ConstructionFailed;
                    effects.push(Effect::ReleaseSocket {
                        generation: self.generation,
                    });
                    effects.push(Effect::Report(Report::ConstructionFailed {
                        reason: reason.clone(),
                    }));
                    effects.push(Effect::SetStatus(StatusUpdate::construction_failed()));
                }
            }

            Event::Opened { .. } => {
                if self.phase == Phase::Connecting {
                    next.phase = Phase::Connected;
                    effects.push(Effect::SetStatus(StatusUpdate::connected()));
                    effects.push(Effect::SendParameters);
                }
            }

            Event::MessageReceived { text, .. } => {
                if self.phase == Phase::Connected {
                    effects.push(Effect::DeliverMessage { text: text.clone() });
                }
            }

            Event::TransportError { reason, .. } => {
                if self.phase.socket_live() {
                    effects.push(Effect::Report(Report::TransportError {
                        reason: reason.clone(),
                    }));
                    effects.push(Effect::SetStatus(StatusUpdate::transport_error()));
                }
            }

            Event::Closed {
                code,
                reason,
                clean,
                ..
            } => {
                if self.phase.socket_live() {
                    next.phase = Phase::Closed { clean: *clean };
                    effects.push(Effect::ReleaseSocket {
                        generation: self.generation,
                    });
                    effects.push(Effect::Report(Report::Closed {
                        code: *code,
                        reason: reason.clone(),
                        clean: *clean,
                    }));
                    if !*clean {
                        next.cancel_timer(&mut effects);
                        let timer = next.next_timer;
                        next.next_timer += 1;
                        next.pending_timer = Some(timer);
                        effects.push(Effect::ScheduleReconnect {
                            timer,
                            delay: self.reconnect_delay,
                        });
                    }
                    effects.push(Effect::SetStatus(StatusUpdate::closed(reason, *clean)));
                }
            }
        }

        (next, effects)
    }

    fn connect(&mut self, effects: &mut Vec<Effect>) {
        self.cancel_timer(effects);

        if self.phase.socket_live() {
            effects.push(Effect::Report(Report::AlreadyConnecting));
            return;
        }

        self.generation += 1;
        self.phase = Phase::Connecting;
        effects.push(Effect::SetStatus(StatusUpdate::connecting()));
        effects.push(Effect::OpenSocket {
            generation: self.generation,
        });
    }

    fn cancel_timer(&mut self, effects: &mut Vec<Effect>) {
        if let Some(timer) = self.pending_timer.take() {
            effects.push(Effect::CancelReconnect { timer });
        }
    }
}
