//! # autolight-app
//!
//! Application layer — controller use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ActuatorGateway` — fire-and-forget relay commands
//!   - `StatusSource` — one-off component status queries
//! - Provide the controller building blocks:
//!   - `EventIngestion` — filter and normalize platform events
//!   - `TimerManager` — named single-shot timers delivered through the inbox
//!   - `DecisionEngine` — the motion / lux / manual state machine
//!   - `Controller` — the sequential event loop tying them together
//!
//! ## Dependency rule
//! Depends on `autolight-domain` only (plus `tokio` for channels, tasks and
//! time). Never imports adapter crates. Adapters depend on *this* crate, not
//! the reverse.

pub mod controller;
pub mod decision_engine;
pub mod ingestion;
pub mod ports;
pub mod timer_manager;
