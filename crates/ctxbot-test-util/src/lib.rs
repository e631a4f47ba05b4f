//! Fakes and fixtures shared by the ctxbot test suites.

pub mod encoder;
pub mod fixtures;
pub mod generator;
pub mod model;
pub mod search;
pub mod services;
pub mod telegram;
