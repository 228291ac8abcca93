// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

//! A module for FFmpeg.

use std::{
    fs,
    path::Path,
    process::{Command, Output},
    sync::OnceLock,
};

use log::debug;
use regex::Regex;
use which::which;

use crate::normalization_error::NormalizationError;

pub const COMMAND_NAME: &str = "ffmpeg";

const NULL_DEVICE: &str = if cfg!(windows) { "NUL" } else { "/dev/null" };

/// Finds a command on `PATH`.
pub fn get_command(command: &str) -> Result<Command, NormalizationError> {
    let command_path = which(command);

    match command_path {
        Ok(command_path) => Ok(Command::new(command_path)),

        Err(error) => Err(NormalizationError::CommandNotFound {
            command: command.to_string(),
            error,
        }),
    }
}

fn run_command(command: &mut Command, command_name: &str) -> Result<(), NormalizationError> {
    debug!("Runs {command:?}");

    let result = command.status();

    match result {
        Ok(exit_status) => {
            if exit_status.success() {
                Ok(())
            } else {
                Err(NormalizationError::CommandFailed {
                    command: command_name.to_string(),
                    status: exit_status,
                })
            }
        }
        Err(error) => Err(NormalizationError::CommandCannotExecuted {
            command: command_name.to_string(),
            error,
        }),
    }
}

/// Runs a command and returns its stdout and stderr as one text.
fn run_command_with_output(
    command: &mut Command,
    command_name: &str,
) -> Result<String, NormalizationError> {
    debug!("Runs {command:?}");

    let Output {
        status,
        stdout,
        stderr,
    } = command
        .output()
        .map_err(|error| NormalizationError::CommandCannotExecuted {
            command: command_name.to_string(),
            error,
        })?;

    if !status.success() {
        return Err(NormalizationError::CommandFailed {
            command: command_name.to_string(),
            status,
        });
    }

    let mut output = String::from_utf8_lossy(&stdout).into_owned();

    output.push_str(&String::from_utf8_lossy(&stderr));

    Ok(output)
}

fn max_volume_regex() -> &'static Regex {
    static MAX_VOLUME: OnceLock<Regex> = OnceLock::new();

    MAX_VOLUME.get_or_init(|| Regex::new(r"max_volume: (\S+) dB").expect("valid pattern"))
}

/// Parses the peak volume from the output of the `volumedetect` filter.
///
/// Only the first `max_volume: <float> dB` line is used.
pub fn parse_max_volume(output: &str) -> Result<f64, NormalizationError> {
    let captures = max_volume_regex()
        .captures(output)
        .ok_or(NormalizationError::MaxVolumeNotFound)?;
    let value = &captures[1];

    // `-inf` is reported for silence and cannot be turned into a gain.
    value
        .parse::<f64>()
        .ok()
        .filter(|max_volume| max_volume.is_finite())
        .ok_or_else(|| NormalizationError::InvalidMaxVolume {
            value: value.to_string(),
        })
}

/// Measures the peak volume of `source_file` in dB.
///
/// Only the audio stream is decoded. The decoded audio is written to the null device.
pub fn detect_max_volume(source_file: &Path) -> Result<f64, NormalizationError> {
    let mut ffmpeg = get_command(COMMAND_NAME)?;
    let command = ffmpeg
        .arg("-hide_banner")
        .arg("-nostdin")
        .arg("-i")
        .arg(source_file)
        .arg("-af")
        .arg("volumedetect")
        .arg("-vn")
        .arg("-sn")
        .arg("-dn")
        .arg("-f")
        .arg("null")
        .arg(NULL_DEVICE);

    let output = run_command_with_output(command, COMMAND_NAME)?;

    parse_max_volume(&output)
}

/// Formats the argument of the `volume` filter.
pub fn volume_filter(gain: f64) -> String {
    format!("volume={gain}dB")
}

/// Writes `destination_file` with the video stream of `source_file` copied and its audio
/// stream amplified by `gain` dB.
///
/// An existing `destination_file` is never overwritten.
pub fn apply_gain(
    source_file: &Path,
    gain: f64,
    destination_file: &Path,
) -> Result<(), NormalizationError> {
    if destination_file.exists() {
        return Err(NormalizationError::OutputExists {
            path: destination_file.to_path_buf(),
        });
    }

    let ffmpeg = get_command(COMMAND_NAME)?;

    apply_gain_with(ffmpeg, source_file, gain, destination_file)
}

/// Runs the re-encode on `ffmpeg`. `destination_file` must not exist beforehand, so a partial
/// output left by a failed command is removed.
fn apply_gain_with(
    mut ffmpeg: Command,
    source_file: &Path,
    gain: f64,
    destination_file: &Path,
) -> Result<(), NormalizationError> {
    let command = ffmpeg
        .arg("-hide_banner")
        .arg("-nostdin")
        .arg("-loglevel")
        .arg("error")
        .arg("-n")
        .arg("-i")
        .arg(source_file)
        .arg("-vcodec")
        .arg("copy")
        .arg("-af")
        .arg(volume_filter(gain))
        .arg(destination_file);

    run_command(command, COMMAND_NAME).inspect_err(|_| {
        if destination_file.exists() {
            debug!("Removes the partial output {destination_file:?}");

            let _ = fs::remove_file(destination_file);
        }
    })
}
