//! Architect Advisor - multi-turn architecture consultation engine.
//!
//! Turns an informal project description into a structured recommendation
//! document. Deterministic option scoring is combined with calls to an external
//! reasoning service, and a self-critique stage decides whether to finish, ask
//! the user for more information, or revisit the option choice.
//!
//! The crate follows a hexagonal layout: `domain` holds pure types and rules,
//! `ports` the external seams, `adapters` their implementations, and
//! `application` the workflow nodes and engine.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
