//! # autolight-domain
//!
//! Pure domain model for the autolight lighting controller.
//!
//! ## Responsibilities
//! - Foundational types: device identity, error conventions, timestamps
//! - Define the **configuration** the controller is started with
//! - Define the **controller state** (mode, light, motion and lux bookkeeping)
//! - Define **platform events** (raw host messages) and **controller events**
//!   (the closed set the decision engine consumes)
//! - Enforce state invariants such as "lux only updates while the light is off"
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod config;
pub mod event;
pub mod platform;
pub mod state;
