// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration Tests for Chainsync Core
//!
//! These tests verify complete workflows across several devices and
//! accounts sharing one journal server: collection management, sharing and
//! multi-device synchronization.
//!
//! Run with: cargo test --test integration

#[path = "../common/mod.rs"]
mod common;

mod collection_workflow_test;
mod sharing_workflow_test;
mod sync_workflow_test;
