//! Per-provider circuit breakers.
//!
//! ```text
//!            threshold failures in window
//!   Closed ───────────────────────────────▶ Open
//!     ▲                                      │ open duration elapsed
//!     │ trial succeeds                       ▼ (next eligibility check)
//!     └──────────────────────────────── HalfOpen
//!                    trial fails: reopen ────┘
//! ```
//!
//! Each breaker lives behind its own map shard lock, so eligibility checks and
//! outcome recording for one provider are serialized without blocking traffic
//! to other providers.

use crate::llm::types::ProviderId;
use crate::router::config::CircuitBreakerConfig;
use dashmap::DashMap;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitBreakerState {
    Closed,
    Open { opened_at: Instant },
    /// One trial call has been granted at `since`
    HalfOpen { since: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitStatus {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: CircuitBreakerState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    last_opened: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: CircuitBreakerState::Closed,
            consecutive_failures: 0,
            last_failure: None,
            last_opened: None,
        }
    }

    /// Whether a call may be dispatched now.
    ///
    /// Pure except for one transition: an open breaker whose open duration has
    /// elapsed flips to half-open and grants exactly one trial. Call it only
    /// immediately before dispatching to this provider.
    pub fn check(&mut self, now: Instant) -> bool {
        if !self.would_admit(now) {
            return false;
        }
        if !matches!(self.state, CircuitBreakerState::Closed) {
            self.state = CircuitBreakerState::HalfOpen { since: now };
        }
        true
    }

    /// What `check` would answer at `now`, without granting a trial
    pub fn would_admit(&self, now: Instant) -> bool {
        match self.state {
            CircuitBreakerState::Closed => true,
            CircuitBreakerState::Open { opened_at } => {
                now.saturating_duration_since(opened_at) >= self.config.open_duration()
            }
            // A trial whose outcome never arrived is re-granted after another open duration
            CircuitBreakerState::HalfOpen { since } => {
                now.saturating_duration_since(since) >= self.config.open_duration()
            }
        }
    }

    /// Read-only gate used right before dispatch
    pub fn is_open(&self) -> bool {
        matches!(self.state, CircuitBreakerState::Open { .. })
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        if let CircuitBreakerState::HalfOpen { .. } = self.state {
            self.state = CircuitBreakerState::Closed;
        }
    }

    /// Record a failed attempt; returns true when this failure opened the breaker
    pub fn record_failure(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_failure
            && now.saturating_duration_since(last) > self.config.failure_window()
        {
            self.consecutive_failures = 0;
        }
        self.consecutive_failures += 1;
        self.last_failure = Some(now);

        match self.state {
            CircuitBreakerState::HalfOpen { .. } => {
                self.open(now);
                true
            }
            CircuitBreakerState::Closed
                if self.consecutive_failures >= self.config.failure_threshold =>
            {
                self.open(now);
                true
            }
            _ => false,
        }
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitBreakerState::Open { opened_at: now };
        self.last_opened = Some(now);
    }

    pub fn reset(&mut self) {
        self.state = CircuitBreakerState::Closed;
        self.consecutive_failures = 0;
        self.last_failure = None;
    }

    pub fn state(&self) -> CircuitBreakerState {
        self.state
    }

    pub fn status(&self) -> CircuitStatus {
        match self.state {
            CircuitBreakerState::Closed => CircuitStatus::Closed,
            CircuitBreakerState::Open { .. } => CircuitStatus::Open,
            CircuitBreakerState::HalfOpen { .. } => CircuitStatus::HalfOpen,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_opened(&self) -> Option<Instant> {
        self.last_opened
    }
}

/// Point-in-time view of one breaker for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitSnapshot {
    pub provider: ProviderId,
    pub status: CircuitStatus,
    pub consecutive_failures: u32,
    /// Time since the breaker last opened, if it ever did
    pub opened_ago: Option<Duration>,
}

/// One independent breaker per provider
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: DashMap<ProviderId, CircuitBreaker>,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    pub fn is_eligible(&self, provider: ProviderId) -> bool {
        let now = Instant::now();
        let mut breaker = self
            .breakers
            .entry(provider)
            .or_insert_with(|| CircuitBreaker::new(self.config.clone()));
        let was_open = breaker.is_open();
        let eligible = breaker.check(now);
        if was_open && eligible {
            info!("Circuit for {} is half-open, allowing a trial request", provider);
        }
        eligible
    }

    /// Read-only eligibility used to build candidate chains
    pub fn would_admit(&self, provider: ProviderId) -> bool {
        self.breakers
            .get(&provider)
            .map(|breaker| breaker.would_admit(Instant::now()))
            .unwrap_or(true)
    }

    pub fn is_open(&self, provider: ProviderId) -> bool {
        self.breakers
            .get(&provider)
            .map(|breaker| breaker.is_open())
            .unwrap_or(false)
    }

    pub fn record_success(&self, provider: ProviderId) {
        if let Some(mut breaker) = self.breakers.get_mut(&provider) {
            let was_half_open = breaker.status() == CircuitStatus::HalfOpen;
            breaker.record_success();
            if was_half_open {
                info!("Circuit for {} closed after successful trial", provider);
            }
        }
    }

    /// Record a failure; returns whether the breaker is open afterwards
    pub fn record_failure(&self, provider: ProviderId) -> bool {
        let mut breaker = self
            .breakers
            .entry(provider)
            .or_insert_with(|| CircuitBreaker::new(self.config.clone()));
        if breaker.record_failure(Instant::now()) {
            warn!(
                "Circuit for {} opened after {} consecutive failures",
                provider,
                breaker.consecutive_failures()
            );
        }
        breaker.is_open()
    }

    pub fn reset(&self, provider: ProviderId) {
        if let Some(mut breaker) = self.breakers.get_mut(&provider) {
            breaker.reset();
            info!("Circuit for {} manually reset", provider);
        }
    }

    pub fn snapshot(&self) -> Vec<CircuitSnapshot> {
        let now = Instant::now();
        let mut snapshots: Vec<CircuitSnapshot> = self
            .breakers
            .iter()
            .map(|entry| CircuitSnapshot {
                provider: *entry.key(),
                status: entry.status(),
                consecutive_failures: entry.consecutive_failures(),
                opened_ago: entry
                    .last_opened()
                    .map(|opened| now.saturating_duration_since(opened)),
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.provider);
        snapshots
    }
}
