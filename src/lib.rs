//! tdock - Terminal UI for Docker
//!
//! Library half of the dashboard: the versioned state store, the TTL cache,
//! the provider seam and the background pollers that keep the state fresh.
//! The binary adds the terminal front end on top.

pub mod actions;
pub mod cache;
pub mod config;
pub mod notification;
pub mod poller;
pub mod provider;
pub mod resource;
pub mod state;
pub mod stats;
