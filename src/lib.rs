//! # petsim - Virtual Pet State Engine
//!
//! petsim tracks a virtual pet's needs, mood, experience and achievements
//! across two independent clocks: discrete care actions (feed, play, sleep,
//! clean) and passive decay over wall-clock time.
//!
//! ## Features
//!
//! - **Deterministic engine**: every transition takes an explicit timestamp, so
//!   decay and sleep expiry can be driven by synthetic time in tests.
//! - **Bounded stats**: hunger, happiness and energy are clamped to `[0, 100]`
//!   and kept at full precision; displays get rounded whole percentages.
//! - **Leveling and achievements**: experience converts into levels, and
//!   counter thresholds unlock achievements exactly once.
//! - **Day/night schedule**: care performed during configured night hours also
//!   counts toward night achievements.
//! - **Pluggable storage**: in-memory or sled-backed stores behind one trait.
//! - **JSON-lines server**: a small Tokio TCP front end for remote clients.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use petsim::config::Config;
//! use petsim::server::PetServer;
//! use petsim::service::PetService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("petsim.toml").await?;
//!     let service = Arc::new(PetService::from_config(&config)?);
//!     PetServer::new(service, &config.server).run().await
//! }
//! ```
//!
//! Using the engine directly:
//!
//! ```rust
//! use chrono::Utc;
//! use petsim::pet::{PetStateEngine, PetType, Rules};
//!
//! let engine = PetStateEngine::new(Rules::default());
//! let now = Utc::now();
//! let mut pet = engine.create("alice", PetType::Fox, now);
//! assert!(engine.feed(&mut pet, now).is_applied());
//! assert_eq!(pet.counters.feed_count, 1);
//! ```
//!
//! ## Module Organization
//!
//! - [`pet`] - data model, rules and the state engine
//! - [`storage`] - pet persistence (memory and sled)
//! - [`service`] - per-user serialized operations, leaderboard and statistics
//! - [`server`] - JSON-lines TCP transport
//! - [`config`] - TOML configuration and validation
//! - [`validation`] - user id normalization
//! - [`metrics`] - process-wide action counters
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   TCP Server    │ ← JSON-lines requests
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   PetService    │ ← per-user locks, load → decay → act → save
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │ PetStateEngine  │ ← pure state transitions
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │    PetStore     │ ← memory or sled
//! └─────────────────┘
//! ```

pub mod config;
pub mod metrics;
pub mod pet;
pub mod server;
pub mod service;
pub mod storage;
pub mod validation;
