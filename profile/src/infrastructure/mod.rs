// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Infrastructure layer for the profile engine
//!
//! Concrete adapters for the ports declared in `crate::domain` and
//! `crate::application`: storage, the event bus and the HTTP extraction
//! client.

pub mod db;
pub mod event_bus;
pub mod extraction_client;
pub mod repositories;

pub use db::Database;
pub use event_bus::{BroadcastEventBus, EventBusError, EventReceiver};
pub use extraction_client::HttpPatternExtractor;
pub use repositories::{InMemoryPatternRepository, InMemoryProfileRepository};
