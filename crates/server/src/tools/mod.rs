//! MCP tool implementations.
//!
//! This module contains all tools exposed by the fact cache server.

pub mod facts;
