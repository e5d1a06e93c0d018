// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for property-based testing.

use proptest::prelude::*;

use chainsync_core::SyncAction;

// ============================================================
// String Strategies
// ============================================================

/// Display names for contacts and events (non-empty, printable).
pub fn display_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ,;:]{0,49}"
        .prop_map(|s| s.trim().to_string())
        .prop_filter("non-empty", |s| !s.is_empty())
}

/// Free text including the characters that need escaping in vCard/iCalendar.
pub fn record_text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,;:\\\\\n]{1,200}"
}

/// Resource uids as clients generate them.
pub fn resource_uid_strategy() -> impl Strategy<Value = String> {
    "[a-f0-9]{8}-[a-f0-9]{4}-4[a-f0-9]{3}-[89ab][a-f0-9]{3}-[a-f0-9]{12}"
}

/// Hex-encoded chain uids (64 chars).
pub fn entry_uid_strategy() -> impl Strategy<Value = String> {
    "[a-f0-9]{64}"
}

// ============================================================
// Byte Array Strategies
// ============================================================

/// Strategy for generating 32-byte arrays (keys).
pub fn bytes32_strategy() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

/// Strategy for generating variable-length byte vectors.
pub fn byte_vec_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), min..max)
}

// ============================================================
// Sync Strategies
// ============================================================

pub fn sync_action_strategy() -> impl Strategy<Value = SyncAction> {
    prop_oneof![
        Just(SyncAction::Add),
        Just(SyncAction::Change),
        Just(SyncAction::Delete),
    ]
}

/// Format versions this client can read.
pub fn version_strategy() -> impl Strategy<Value = u8> {
    1u8..=2u8
}

/// Strategy for generating small counts (for loop iterations).
pub fn small_count_strategy() -> impl Strategy<Value = usize> {
    1usize..20usize
}
