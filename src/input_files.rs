// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Enumeration of input files and naming of output files.

use std::{
    collections::HashSet,
    env,
    ffi::OsString,
    io,
    path::{Path, PathBuf},
};

use log::{info, warn};
use thiserror::Error;

/// Error of expanding a file pattern.
#[derive(Error, Debug)]
pub enum InputFilesError {
    #[error("No file name provided")]
    EmptyPattern,

    #[error("File pattern is invalid: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    #[error("Current directory cannot be read: {0}")]
    CurrentDirectory(io::Error),
}

fn to_absolute_pattern(pattern: &str) -> Result<String, InputFilesError> {
    let path = Path::new(pattern);

    if path.is_absolute() {
        return Ok(pattern.to_owned());
    }

    let current_directory = env::current_dir().map_err(InputFilesError::CurrentDirectory)?;
    let mut absolute_pattern = glob::Pattern::escape(&current_directory.to_string_lossy());

    absolute_pattern.push(std::path::MAIN_SEPARATOR);
    absolute_pattern.push_str(pattern);

    Ok(absolute_pattern)
}

/// Expands a glob pattern to absolute paths of files.
///
/// The paths are sorted and deduplicated. A pattern that matches nothing gives an empty list.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, InputFilesError> {
    if pattern.trim().is_empty() {
        return Err(InputFilesError::EmptyPattern);
    }

    let absolute_pattern = to_absolute_pattern(pattern)?;

    let mut paths: Vec<PathBuf> = glob::glob(&absolute_pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(error) => {
                warn!("{:?} cannot be read: {}", error.path(), error.error());

                None
            }
        })
        .filter(|path| path.is_file())
        .collect();

    paths.sort();
    paths.dedup();

    Ok(paths)
}

/// Whether `path` has the name [`derive_output_path`] gives.
///
/// The stem must end with `extension_prefix`, and either the prefix is the last extension of
/// the stem (`.vol` in `video.vol.mkv`) or the file without the prefix is in `batch`.
fn is_processed(path: &Path, extension_prefix: &str, batch: &HashSet<&Path>) -> bool {
    let (Some(stem), Some(extension)) = (
        path.file_stem().and_then(|stem| stem.to_str()),
        path.extension(),
    ) else {
        return false;
    };

    let Some(source_stem) = stem
        .strip_suffix(extension_prefix)
        .filter(|source_stem| !source_stem.is_empty())
    else {
        return false;
    };

    let is_last_extension = extension_prefix
        .strip_prefix('.')
        .is_some_and(|prefix_extension| {
            Path::new(stem)
                .extension()
                .is_some_and(|stem_extension| stem_extension == prefix_extension)
        });

    if is_last_extension {
        return true;
    }

    let source_file = {
        let mut filename = OsString::from(source_stem);

        filename.push(".");
        filename.push(extension);

        path.with_file_name(filename)
    };

    batch.contains(source_file.as_path())
}

/// Removes files that are already outputs, e.g. `video.vol.mkv` for the prefix `.vol`.
pub fn filter_processed<T: AsRef<Path>>(paths: &[T], extension_prefix: &str) -> Vec<PathBuf> {
    let batch: HashSet<&Path> = paths.iter().map(AsRef::<Path>::as_ref).collect();

    paths
        .iter()
        .filter_map(|path| {
            let path: &Path = path.as_ref();

            if is_processed(path, extension_prefix, &batch) {
                info!("Skips already processed {}", path.display());

                None
            } else {
                Some(path.to_path_buf())
            }
        })
        .collect()
}

/// Inserts `extension_prefix` before the last extension of the file name.
///
/// `video.mkv` becomes `video.vol.mkv` for the prefix `.vol`. `None` is returned when the
/// file name has no extension.
pub fn derive_output_path(source_file: &Path, extension_prefix: &str) -> Option<PathBuf> {
    let stem = source_file.file_stem()?;
    let extension = source_file.extension()?;

    let filename = {
        let mut filename = OsString::from(stem);

        filename.push(extension_prefix);
        filename.push(".");
        filename.push(extension);

        filename
    };

    Some(source_file.with_file_name(filename))
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn output_path_has_prefix_before_extension() {
        assert_eq!(
            PathBuf::from("/videos/video.vol.mkv"),
            derive_output_path(Path::new("/videos/video.mkv"), ".vol").unwrap()
        );
    }

    #[test]
    fn output_path_with_multiple_extensions() {
        assert_eq!(
            PathBuf::from("movie.part1.norm.mp4"),
            derive_output_path(Path::new("movie.part1.mp4"), ".norm").unwrap()
        );
    }

    #[test]
    fn output_path_keeps_dotted_directory() {
        assert_eq!(
            PathBuf::from("/media.d/clip.vol.avi"),
            derive_output_path(Path::new("/media.d/clip.avi"), ".vol").unwrap()
        );
    }

    #[test]
    fn output_path_without_extension() {
        assert!(derive_output_path(Path::new("/media.d/clip"), ".vol").is_none());
    }

    #[test]
    fn output_path_of_dotfile() {
        assert!(derive_output_path(Path::new(".hidden"), ".vol").is_none());
    }

    #[test]
    fn test_filter_processed() {
        let source = Path::new("a.mkv");
        let processed = Path::new("b.vol.mkv");
        let other_prefix = Path::new("c.norm.mkv");

        let result = filter_processed(&[source, processed, other_prefix], ".vol");

        assert_eq!(vec![source.to_path_buf(), other_prefix.to_path_buf()], result);
    }

    #[test]
    fn digit_prefix_keeps_source() {
        let result = filter_processed(&[Path::new("/videos/part2.mkv")], "2");

        assert_eq!(vec![PathBuf::from("/videos/part2.mkv")], result);
    }

    #[test]
    fn letter_prefix_keeps_sources() {
        let paths = [Path::new("/videos/video.mkv"), Path::new("/videos/part2.mkv")];

        let result = filter_processed(&paths, "o");

        assert_eq!(
            vec![
                PathBuf::from("/videos/video.mkv"),
                PathBuf::from("/videos/part2.mkv"),
            ],
            result
        );
    }

    #[test]
    fn undotted_prefix_with_source_in_batch() {
        let paths = [
            Path::new("/videos/video.mkv"),
            Path::new("/videos/video_norm.mkv"),
        ];

        let result = filter_processed(&paths, "_norm");

        assert_eq!(vec![PathBuf::from("/videos/video.mkv")], result);
    }

    #[test]
    fn undotted_prefix_with_other_extension() {
        let paths = [
            Path::new("/videos/video.mp4"),
            Path::new("/videos/video_norm.mkv"),
        ];

        let result = filter_processed(&paths, "_norm");

        assert_eq!(2, result.len());
    }

    #[test]
    fn dotted_prefix_without_source_in_batch() {
        let result = filter_processed(&[Path::new("/videos/video.vol.mkv")], ".vol");

        assert!(result.is_empty());
    }

    #[test]
    fn file_named_like_prefix_is_not_processed() {
        let result = filter_processed(&[Path::new(".vol")], ".vol");

        assert_eq!(1, result.len());
    }

    #[test]
    fn empty_pattern() {
        assert!(matches!(
            expand_pattern(""),
            Err(InputFilesError::EmptyPattern)
        ));
        assert!(matches!(
            expand_pattern("  "),
            Err(InputFilesError::EmptyPattern)
        ));
    }

    #[test]
    fn invalid_pattern() {
        assert!(matches!(
            expand_pattern("/videos/[*.mkv"),
            Err(InputFilesError::InvalidPattern(_))
        ));
    }

    #[test]
    fn expanded_paths_are_sorted_files() {
        let directory = tempdir().unwrap();

        for filename in ["c.mkv", "a.mkv", "b.mkv", "d.txt"] {
            File::create(directory.path().join(filename)).unwrap();
        }
        fs::create_dir(directory.path().join("e.mkv")).unwrap();

        let pattern = directory.path().join("*.mkv");
        let paths = expand_pattern(pattern.to_str().unwrap()).unwrap();

        assert_eq!(
            vec![
                directory.path().join("a.mkv"),
                directory.path().join("b.mkv"),
                directory.path().join("c.mkv"),
            ],
            paths
        );
    }

    #[test]
    fn unmatched_pattern_is_empty() {
        let directory = tempdir().unwrap();
        let pattern = directory.path().join("*.mkv");

        assert!(expand_pattern(pattern.to_str().unwrap())
            .unwrap()
            .is_empty());
    }
}
