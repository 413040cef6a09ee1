//! Latrine sensor control core.
//!
//! A battery-powered sensor that watches a pit latrine's outflow pipe for
//! flushes and periodically checks whether the pit is full.  This crate
//! holds everything above the board support layer: the table-driven FSM
//! engine, the sensing filters, the application service and its ports.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod handoff;
pub mod scheduler;
pub mod sensors;
pub mod threshold;
pub mod uplink;
