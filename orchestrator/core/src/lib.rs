// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Provisioning orchestrator for a two-capability travel-planning agent.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Declares the resource graph and hands it to a deployment engine

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
