// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::{path::PathBuf, process::ExitStatus};

use thiserror::Error;

/// Error about analyzing or re-encoding a file.
#[derive(Error, Debug)]
pub enum NormalizationError {
    #[error("{path} has no extension to insert the prefix before.")]
    NoExtension { path: PathBuf },

    #[error("{path} already exists.")]
    OutputExists { path: PathBuf },

    #[error("max_volume is not found in the output of ffmpeg.")]
    MaxVolumeNotFound,

    #[error("max_volume `{value}` is not a number.")]
    InvalidMaxVolume { value: String },

    #[error("Command {command} is not found: {error}")]
    CommandNotFound {
        command: String,
        error: which::Error,
    },

    #[error("Command {command} is failed: {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("Command {command} cannot be executed: {error}")]
    CommandCannotExecuted {
        command: String,
        error: std::io::Error,
    },
}
