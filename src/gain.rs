// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Computation of the gain applied to a file.

/// Computes the gain in dB that brings `max_volume` to 0 dB, plus `extra_gain`.
///
/// Returns `None` when the file is already normalized and no extra gain is requested.
pub fn corrective_gain(max_volume: f64, extra_gain: f64) -> Option<f64> {
    if max_volume == 0.0 && extra_gain == 0.0 {
        None
    } else {
        Some(-max_volume + extra_gain)
    }
}
