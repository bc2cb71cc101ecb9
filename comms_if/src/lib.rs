//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the arm software: the
//! telecommands accepted by arm control and the equipment-level joint
//! definitions shared between arm control and its command sources.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand definitions and parsing
pub mod tc;

/// Command and response definitions for equipment (like the arm)
pub mod eqpt;
