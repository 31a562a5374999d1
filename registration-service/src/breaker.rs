use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long an open circuit rejects calls before one trial goes through.
    pub sleep_window: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            sleep_window: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed { failures: u32 },
    Open { since: Instant },
    /// One trial call is in flight, everyone else is rejected until it reports.
    HalfOpen { since: Instant },
}

impl Default for CircuitState {
    fn default() -> Self {
        Self::Closed { failures: 0 }
    }
}

impl CircuitState {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn is_half_open(&self) -> bool {
        matches!(self, Self::HalfOpen { .. })
    }

    fn allow(self, config: &BreakerConfig, now: Instant) -> (bool, Self) {
        match self {
            Self::Closed { .. } => (true, self),
            // a trial that never reported back (cancelled caller) is replaced
            // after another window
            Self::Open { since } | Self::HalfOpen { since }
                if now.duration_since(since) >= config.sleep_window =>
            {
                (true, Self::HalfOpen { since: now })
            }
            Self::Open { .. } | Self::HalfOpen { .. } => (false, self),
        }
    }

    fn record(self, config: &BreakerConfig, ok: bool, now: Instant) -> Self {
        match (self, ok) {
            (_, true) => Self::Closed { failures: 0 },
            (Self::Closed { failures }, false) if failures + 1 < config.failure_threshold => {
                Self::Closed {
                    failures: failures + 1,
                }
            }
            (_, false) => Self::Open { since: now },
        }
    }
}

/// Circuits keyed by command name, e.g. `user-microservice.create_user`.
#[derive(Debug, Default)]
pub struct Breakers {
    config: BreakerConfig,
    circuits: Mutex<HashMap<String, CircuitState>>,
}

impl Breakers {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            circuits: Default::default(),
        }
    }

    fn update<R>(&self, command: &str, f: impl FnOnce(CircuitState) -> (R, CircuitState)) -> R {
        let mut circuits = self.circuits.lock().unwrap_or_else(|e| e.into_inner());
        let state = circuits.entry(command.to_owned()).or_default();
        let (rv, next) = f(*state);
        *state = next;
        rv
    }

    /// Asks to run `command` now. While half open only the caller that made
    /// the circuit leave the open state gets `true`.
    pub fn allow(&self, command: &str) -> bool {
        let now = Instant::now();
        self.update(command, |state| {
            let (allowed, next) = state.allow(&self.config, now);
            if next.is_half_open() && !state.is_half_open() {
                log::info!("circuit of {} is half open, trying one call", command);
            }
            (allowed, next)
        })
    }

    pub fn success(&self, command: &str) {
        self.update(command, |state| {
            if !state.is_closed() {
                log::info!("circuit of {} is closed again", command);
            }
            ((), state.record(&self.config, true, Instant::now()))
        })
    }

    pub fn failure(&self, command: &str) {
        self.update(command, |state| {
            let next = state.record(&self.config, false, Instant::now());
            if next.is_open() {
                log::warn!("circuit of {} is open", command);
            }
            ((), next)
        })
    }

    pub fn state(&self, command: &str) -> CircuitState {
        self.update(command, |state| (state, state))
    }
}
