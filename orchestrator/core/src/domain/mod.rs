// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Resource graph model, provisioners and the deployment engine port.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure declaration logic, no provider I/O

pub mod constants;
pub mod engine;
pub mod events;
pub mod graph;
pub mod naming;
pub mod plan;
pub mod policy;
pub mod provisioner;
pub mod resource;
pub mod run_context;
pub mod secret;
pub mod stack_config;
