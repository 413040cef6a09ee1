//! Sensing filters: the integer [`averager`], per-channel [`debounce`]
//! counters, the [`flow`] detection filter and [`temperature`] types.
//!
//! Everything in here is pure state; ISR data arrives through
//! [`crate::handoff`] and is fed in by the application service.

pub mod averager;
pub mod debounce;
pub mod flow;
pub mod temperature;

use serde::{Deserialize, Serialize};

/// Independent pulse sensing channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Channel {
    /// IR beam across the outflow pipe.
    Outflow = 0,
    /// IR beam at the pit's full mark.
    Level = 1,
}

impl Channel {
    pub const COUNT: usize = 2;
}
