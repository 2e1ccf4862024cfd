//! # cgt-core
//!
//! Core types for talking to a combinatorial game theory engine.
//!
//! This crate provides the foundational types shared by the transport and client crates:
//! - Game construction requests (Domineering, Snort)
//! - Game values returned by the engine
//! - Session configuration and protocol versions
//! - Error taxonomy

pub mod config;
pub mod error;
pub mod game_value;
pub mod request;

pub use config::{DEFAULT_ENGINE, DEFAULT_MAX_LINE_BYTES, EngineConfig, ProtocolVersion};
pub use error::{CgtError, EngineFailure, Result};
pub use game_value::{GameValue, ParseTemperatureError, Temperature};
pub use request::{
    DomineeringRequest, InvalidVertexColor, Request, SnortRequest, VertexColor, VertexColoring,
};
