// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

pub mod ffmpeg;
pub mod file_mover;
pub mod gain;
pub mod input_files;
pub mod normalization_error;
pub mod normalizer;
