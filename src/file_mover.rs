// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Moving original files out of the source folder.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::debug;
use thiserror::Error;

/// A file moved by [`FileMover`].
#[derive(Debug, Clone, PartialEq)]
pub struct MovedFile {
    pub source: PathBuf,

    pub destination: PathBuf,
}

#[derive(Error, Debug)]
pub enum FileMovingError {
    #[error("Target folder doesn't exist ({0})")]
    DestinationDirectoryNotFound(PathBuf),

    #[error("{0} has no file name")]
    InvalidName(PathBuf),

    #[error("{0} already exists")]
    DestinationExists(PathBuf),

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Moves files into a directory with their file names kept.
#[derive(Debug)]
pub struct FileMover {
    destination_directory: PathBuf,
}

impl FileMover {
    pub fn new<T: AsRef<Path>>(destination_directory: T) -> Result<Self, FileMovingError> {
        let destination_directory = destination_directory.as_ref();

        if !destination_directory.is_dir() {
            return Err(FileMovingError::DestinationDirectoryNotFound(
                destination_directory.to_path_buf(),
            ));
        }

        Ok(FileMover {
            destination_directory: destination_directory.to_path_buf(),
        })
    }

    pub fn move_file<T: AsRef<Path>>(&self, source_file: T) -> Result<MovedFile, FileMovingError> {
        let source_file = source_file.as_ref();
        let filename = source_file
            .file_name()
            .ok_or_else(|| FileMovingError::InvalidName(source_file.to_path_buf()))?;
        let destination = self.destination_directory.join(filename);

        if destination.exists() {
            return Err(FileMovingError::DestinationExists(destination));
        }

        debug!("Moves {source_file:?} to {destination:?}");

        if let Err(error) = fs::rename(source_file, &destination) {
            // Renaming fails across file systems.
            debug!("Renaming is failed, copies instead: {error}");

            fs::copy(source_file, &destination)?;

            if let Err(error) = fs::remove_file(source_file) {
                let _ = fs::remove_file(&destination);

                return Err(FileMovingError::IoError(error));
            }
        }

        Ok(MovedFile {
            source: source_file.to_path_buf(),
            destination,
        })
    }
}
