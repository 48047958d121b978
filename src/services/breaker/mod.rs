//! Per-endpoint circuit breaking.
//!
//! Each webhook id owns one [`CircuitBreaker`] instance, created lazily by
//! the [`CircuitBreakerRegistry`] on first use. Breakers never share state:
//! a failing endpoint is isolated without affecting deliveries elsewhere.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::models::BreakerSettings;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
	/// Normal operation; failures accumulate
	Closed,
	/// All calls denied until the reset timeout elapses
	Open,
	/// Exactly one trial call permitted
	HalfOpen,
}

impl std::fmt::Display for CircuitState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			CircuitState::Closed => write!(f, "closed"),
			CircuitState::Open => write!(f, "open"),
			CircuitState::HalfOpen => write!(f, "half-open"),
		}
	}
}

/// Breaker tuning, shared by every endpoint's instance.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
	/// Failures within the monitoring window that trip the breaker
	pub failure_threshold: u32,
	/// How long an open breaker denies calls before permitting a trial
	pub reset_timeout: Duration,
	/// Rolling window for counting failures
	pub monitoring_window: Duration,
}

impl From<&BreakerSettings> for CircuitBreakerConfig {
	fn from(settings: &BreakerSettings) -> Self {
		Self {
			failure_threshold: settings.failure_threshold,
			reset_timeout: Duration::milliseconds(settings.reset_timeout_ms as i64),
			monitoring_window: Duration::milliseconds(settings.monitoring_window_ms as i64),
		}
	}
}

impl Default for CircuitBreakerConfig {
	fn default() -> Self {
		(&BreakerSettings::default()).into()
	}
}

/// Monitoring snapshot of one breaker.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStatus {
	pub state: CircuitState,
	pub failure_count: usize,
	pub success_count: u64,
	pub last_failure_at: Option<DateTime<Utc>>,
	pub next_attempt_at: Option<DateTime<Utc>>,
}

/// Failure-isolation state machine for a single webhook endpoint.
pub struct CircuitBreaker {
	config: CircuitBreakerConfig,
	state: CircuitState,
	/// Failure timestamps inside the monitoring window
	failures: VecDeque<DateTime<Utc>>,
	success_count: u64,
	last_failure_at: Option<DateTime<Utc>>,
	next_attempt_at: Option<DateTime<Utc>>,
	/// Whether the single half-open trial has been handed out
	trial_in_flight: bool,
}

impl CircuitBreaker {
	pub fn new(config: CircuitBreakerConfig) -> Self {
		Self {
			config,
			state: CircuitState::Closed,
			failures: VecDeque::new(),
			success_count: 0,
			last_failure_at: None,
			next_attempt_at: None,
			trial_in_flight: false,
		}
	}

	/// Whether a call may proceed right now.
	///
	/// An open breaker whose reset timeout has elapsed transitions to
	/// half-open and hands out exactly one trial; further calls are denied
	/// until that trial reports its outcome.
	pub fn can_execute(&mut self) -> bool {
		self.can_execute_at(Utc::now())
	}

	fn can_execute_at(&mut self, now: DateTime<Utc>) -> bool {
		match self.state {
			CircuitState::Closed => true,
			CircuitState::Open => {
				let elapsed = self
					.next_attempt_at
					.map(|at| now >= at)
					.unwrap_or(true);
				if elapsed {
					tracing::debug!("circuit breaker transitioning open -> half-open");
					self.state = CircuitState::HalfOpen;
					self.trial_in_flight = true;
					true
				} else {
					false
				}
			}
			CircuitState::HalfOpen => {
				if self.trial_in_flight {
					false
				} else {
					self.trial_in_flight = true;
					true
				}
			}
		}
	}

	/// Records a successful call.
	pub fn record_success(&mut self) {
		self.success_count += 1;
		if self.state == CircuitState::HalfOpen {
			tracing::info!("circuit breaker trial succeeded, closing");
			self.state = CircuitState::Closed;
			self.failures.clear();
			self.next_attempt_at = None;
			self.trial_in_flight = false;
		}
	}

	/// Records a failed call, possibly tripping the breaker.
	pub fn record_failure(&mut self) {
		self.record_failure_at(Utc::now());
	}

	fn record_failure_at(&mut self, now: DateTime<Utc>) {
		self.last_failure_at = Some(now);
		self.failures.push_back(now);
		self.prune(now);

		match self.state {
			CircuitState::HalfOpen => {
				tracing::warn!("circuit breaker trial failed, reopening");
				self.open_at(now);
			}
			CircuitState::Closed => {
				if self.failures.len() >= self.config.failure_threshold as usize {
					tracing::warn!(
						failures = self.failures.len(),
						"failure threshold reached, opening circuit breaker"
					);
					self.open_at(now);
				}
			}
			CircuitState::Open => {}
		}
	}

	fn open_at(&mut self, now: DateTime<Utc>) {
		self.state = CircuitState::Open;
		self.next_attempt_at = Some(now + self.config.reset_timeout);
		self.trial_in_flight = false;
	}

	/// Drops failures older than the monitoring window.
	fn prune(&mut self, now: DateTime<Utc>) {
		let cutoff = now - self.config.monitoring_window;
		while self
			.failures
			.front()
			.map(|at| *at < cutoff)
			.unwrap_or(false)
		{
			self.failures.pop_front();
		}
	}

	/// Operational override: close the breaker and clear counters.
	pub fn reset(&mut self) {
		self.state = CircuitState::Closed;
		self.failures.clear();
		self.success_count = 0;
		self.last_failure_at = None;
		self.next_attempt_at = None;
		self.trial_in_flight = false;
	}

	/// Operational override: open the breaker for a full reset timeout.
	pub fn force_open(&mut self) {
		self.open_at(Utc::now());
	}

	pub fn state(&self) -> CircuitState {
		self.state
	}

	/// Failures currently inside the monitoring window.
	pub fn failure_count(&mut self) -> usize {
		self.prune(Utc::now());
		self.failures.len()
	}

	pub fn next_attempt_at(&self) -> Option<DateTime<Utc>> {
		self.next_attempt_at
	}

	/// Monitoring snapshot of the breaker's current state.
	pub fn status(&mut self) -> CircuitBreakerStatus {
		self.prune(Utc::now());
		CircuitBreakerStatus {
			state: self.state,
			failure_count: self.failures.len(),
			success_count: self.success_count,
			last_failure_at: self.last_failure_at,
			next_attempt_at: self.next_attempt_at,
		}
	}
}

/// Lazily-populated map of webhook id to breaker instance.
pub struct CircuitBreakerRegistry {
	config: CircuitBreakerConfig,
	breakers: RwLock<HashMap<String, Arc<Mutex<CircuitBreaker>>>>,
}

impl CircuitBreakerRegistry {
	pub fn new(config: CircuitBreakerConfig) -> Self {
		Self {
			config,
			breakers: RwLock::new(HashMap::new()),
		}
	}

	/// Get or create the breaker owned by `webhook_id`.
	pub async fn get_or_create(&self, webhook_id: &str) -> Arc<Mutex<CircuitBreaker>> {
		// Fast path: read lock
		if let Some(breaker) = self.breakers.read().await.get(webhook_id) {
			return breaker.clone();
		}

		// Slow path: write lock
		let mut breakers = self.breakers.write().await;
		// Double-check: another task might have created it
		if let Some(breaker) = breakers.get(webhook_id) {
			return breaker.clone();
		}

		let breaker = Arc::new(Mutex::new(CircuitBreaker::new(self.config.clone())));
		breakers.insert(webhook_id.to_string(), breaker.clone());
		breaker
	}

	/// Monitoring snapshot for one webhook, if a breaker exists.
	pub async fn status(&self, webhook_id: &str) -> Option<CircuitBreakerStatus> {
		let breaker = self.breakers.read().await.get(webhook_id)?.clone();
		let mut breaker = breaker.lock().await;
		Some(breaker.status())
	}
}
