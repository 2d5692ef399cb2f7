// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Somnia CLI

pub mod analyze;
pub mod config;
pub mod profile;
pub mod update;

pub use self::analyze::AnalyzeCommand;
pub use self::config::ConfigCommand;
pub use self::profile::ProfileCommand;
pub use self::update::UpdateCommand;
