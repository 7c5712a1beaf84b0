//! Skill market data: demand sources, storage, the run-locked refresher and its daily schedule.

pub mod demand;
pub mod handlers;
pub mod refresher;
pub mod schedule;
pub mod store;
