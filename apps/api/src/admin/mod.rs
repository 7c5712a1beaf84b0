//! Admin review of student submissions and market data control.

pub mod handlers;
pub mod review;
