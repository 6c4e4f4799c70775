// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod float24;
pub mod types;

pub use types::*;
