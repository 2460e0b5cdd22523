//! HTTP surface of the fleet node: cache invalidation endpoints, login,
//! permission checks, and the peer broadcast plumbing behind them.

pub mod audit;
pub mod broadcast;
pub mod captcha;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod observer;
pub mod rest;
pub mod service;
pub mod telemetry;
