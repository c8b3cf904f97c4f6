//! Ampbox CLI Library
//!
//! Terminal front-end for remote Ampbox sessions: create a session for the
//! current directory, resume a paused one, or list existing sessions, while
//! streaming session events as human-readable lines.

pub mod cli;
pub mod config;
pub mod config_cmd;
pub mod render;
pub mod runner;
pub mod session_fmt;
