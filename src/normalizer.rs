// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

//! This module has the function that called by the main function.

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::{
    ffmpeg,
    file_mover::{FileMover, FileMovingError, MovedFile},
    gain,
    input_files::{self, InputFilesError},
    normalization_error::NormalizationError,
};

const LONG_ABOUT: &str = "\
Normalizes the audio volume of video files.

The maximum volume of each file is measured with ffmpeg and the audio is \
amplified so that the maximum volume becomes 0.0 dB. An optional gain is \
applied on top of it. The video stream is copied as it is.

The processed file is saved with a prefix before its extension (e.g. \
'video.mkv' becomes 'video.vol.mkv') and the original file is moved to \
another folder, so only the processed file remains in the source folder.";

/// The struct for setting.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = LONG_ABOUT)]
pub struct Setting {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "File(s) to normalize (glob allowed!)"
    )]
    file: Option<String>,

    #[arg(
        short,
        long,
        value_name = "PREFIX",
        default_value = ".vol",
        help = "File extension prefix for processed file (e.g. video.mkv -> video.vol.mkv)"
    )]
    ext: String,

    #[arg(
        short,
        long = "move",
        value_name = "FOLDER",
        help = "Folder to move original files to after processing"
    )]
    move_to: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "GAIN",
        default_value_t = 0.0,
        allow_negative_numbers = true,
        help = "Gain in dB to apply on top of automatic normalizing"
    )]
    gain: f64,

    #[arg(
        short,
        long,
        help = "Continues with the next file when a file fails, and fails at the end"
    )]
    keep_going: bool,
}

/// Result of a file.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputResult {
    /// The file is re-encoded and the original file is moved.
    Normalized {
        source: PathBuf,
        destination: PathBuf,
        moved_to: PathBuf,
        max_volume: f64,
        gain: f64,
    },

    /// The file needs no gain.
    Skipped { source: PathBuf, max_volume: f64 },
}

/// Error of normalize.
#[derive(Error, Debug)]
pub enum NormalizerError {
    #[error("ffmpeg couldn't be found")]
    FfmpegNotFound(NormalizationError),

    #[error("{0}")]
    InputFiles(InputFilesError),

    #[error("Extension prefix must not be empty")]
    EmptyExtensionPrefix,

    #[error("Target must not be empty")]
    EmptyTargetFolder,

    #[error("Target folder doesn't exist ({0})")]
    TargetFolderNotFound(PathBuf),

    #[error("Gain must be a finite number ({0})")]
    InvalidGain(f64),

    #[error("File doesn't exist ({0})")]
    FileNotFound(PathBuf),

    #[error("Normalizing {path} is failed: {error}")]
    NormalizationFailed {
        path: PathBuf,
        error: NormalizationError,
    },

    #[error("Moving {path} is failed: {error}")]
    MovingFailed {
        path: PathBuf,
        error: FileMovingError,
    },

    #[error("{count} file(s) could not be normalized")]
    FilesFailed { count: usize },
}

#[cfg_attr(test, mockall::automock)]
trait NormalizerRunner {
    fn find_ffmpeg(&self) -> Result<(), NormalizationError>;

    fn detect_max_volume(&self, source_file: &Path) -> Result<f64, NormalizationError>;

    fn apply_gain(
        &self,
        source_file: &Path,
        gain: f64,
        destination_file: &Path,
    ) -> Result<(), NormalizationError>;

    fn move_file(
        &self,
        source_file: &Path,
        destination_directory: &Path,
    ) -> Result<MovedFile, FileMovingError>;
}

struct Normalizer;

impl NormalizerRunner for Normalizer {
    fn find_ffmpeg(&self) -> Result<(), NormalizationError> {
        ffmpeg::get_command(ffmpeg::COMMAND_NAME).map(|_| ())
    }

    fn detect_max_volume(&self, source_file: &Path) -> Result<f64, NormalizationError> {
        ffmpeg::detect_max_volume(source_file)
    }

    fn apply_gain(
        &self,
        source_file: &Path,
        gain: f64,
        destination_file: &Path,
    ) -> Result<(), NormalizationError> {
        ffmpeg::apply_gain(source_file, gain, destination_file)
    }

    fn move_file(
        &self,
        source_file: &Path,
        destination_directory: &Path,
    ) -> Result<MovedFile, FileMovingError> {
        let file_mover = FileMover::new(destination_directory)?;

        file_mover.move_file(source_file)
    }
}

/// Checks the setting and returns the file pattern and the target folder.
fn validate_setting(setting: &Setting) -> Result<(&str, &Path), NormalizerError> {
    let pattern = setting
        .file
        .as_deref()
        .filter(|pattern| !pattern.trim().is_empty())
        .ok_or(NormalizerError::InputFiles(InputFilesError::EmptyPattern))?;

    if setting.ext.is_empty() {
        return Err(NormalizerError::EmptyExtensionPrefix);
    }

    let target_folder = setting
        .move_to
        .as_deref()
        .filter(|target_folder| !target_folder.as_os_str().is_empty())
        .ok_or(NormalizerError::EmptyTargetFolder)?;

    if !target_folder.is_dir() {
        return Err(NormalizerError::TargetFolderNotFound(
            target_folder.to_path_buf(),
        ));
    }

    if !setting.gain.is_finite() {
        return Err(NormalizerError::InvalidGain(setting.gain));
    }

    Ok((pattern, target_folder))
}

fn normalize_file<T: NormalizerRunner>(
    setting: &Setting,
    runner: &T,
    source_file: &Path,
    target_folder: &Path,
) -> Result<OutputResult, NormalizerError> {
    let normalization_failed = |error: NormalizationError| NormalizerError::NormalizationFailed {
        path: source_file.to_path_buf(),
        error,
    };

    info!("- Analyzing…");

    let max_volume = runner
        .detect_max_volume(source_file)
        .map_err(normalization_failed)?;

    info!("  - max volume: {max_volume} dB");

    let Some(gain) = gain::corrective_gain(max_volume, setting.gain) else {
        info!("- Nothing to do, skipping!");

        return Ok(OutputResult::Skipped {
            source: source_file.to_path_buf(),
            max_volume,
        });
    };

    info!("- Processing…");
    info!("  - new volume: {gain} dB");

    let destination = input_files::derive_output_path(source_file, &setting.ext).ok_or_else(
        || {
            normalization_failed(NormalizationError::NoExtension {
                path: source_file.to_path_buf(),
            })
        },
    )?;

    info!("  - new filename: {}", destination.display());

    runner
        .apply_gain(source_file, gain, &destination)
        .map_err(normalization_failed)?;

    info!("  - new volume set");

    let moved_file = runner
        .move_file(source_file, target_folder)
        .map_err(|error| NormalizerError::MovingFailed {
            path: source_file.to_path_buf(),
            error,
        })?;

    info!(
        "  - original file was moved to {}",
        target_folder.display()
    );

    Ok(OutputResult::Normalized {
        source: source_file.to_path_buf(),
        destination,
        moved_to: moved_file.destination,
        max_volume,
        gain,
    })
}

fn normalize_on_runner<T: NormalizerRunner>(
    setting: &Setting,
    runner: T,
) -> Result<Vec<OutputResult>, NormalizerError> {
    let (pattern, target_folder) = validate_setting(setting)?;

    runner
        .find_ffmpeg()
        .map_err(NormalizerError::FfmpegNotFound)?;

    let matched_files =
        input_files::expand_pattern(pattern).map_err(NormalizerError::InputFiles)?;
    let source_files = input_files::filter_processed(matched_files.as_slice(), &setting.ext);

    debug!(
        "{} file(s) matched, {} file(s) already processed",
        matched_files.len(),
        matched_files.len() - source_files.len()
    );

    if source_files.is_empty() {
        warn!("No file to normalize: {pattern}");
    }

    let total = source_files.len();
    let mut output_results = Vec::with_capacity(total);
    let mut failed_count = 0;

    for (index, source_file) in source_files.iter().enumerate() {
        info!("[{}/{}] Working {}…", index + 1, total, source_file.display());

        // The file may have been removed since the pattern was expanded.
        let result = if source_file.exists() {
            normalize_file(setting, &runner, source_file, target_folder)
        } else {
            Err(NormalizerError::FileNotFound(source_file.clone()))
        };

        match result {
            Ok(output_result) => output_results.push(output_result),
            Err(error) if setting.keep_going => {
                error!("- ERROR: {error}");

                failed_count += 1;
            }
            Err(error) => return Err(error),
        }

        info!("");
    }

    if failed_count > 0 {
        return Err(NormalizerError::FilesFailed {
            count: failed_count,
        });
    }

    info!("Completed.");

    Ok(output_results)
}

/// Normalizes the audio volume of video files.
///
/// Each file matched by the pattern of `setting` is re-encoded with the gain that brings its
/// maximum volume to 0 dB, and the original file is moved to the target folder. The first
/// failure stops the run unless `--keep-going` is given.
pub fn normalize(setting: &Setting) -> Result<Vec<OutputResult>, NormalizerError> {
    normalize_on_runner(setting, Normalizer)
}
