// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::{
    path::Path,
    process::{Command, Stdio},
};

use anyhow::{ensure, Result};

/// Whether ffmpeg is missing. A notice is printed for the skipped test.
pub fn skip_without_ffmpeg(test_name: &str) -> bool {
    let is_missing = which::which("ffmpeg").is_err();

    if is_missing {
        eprintln!("SKIPPED {test_name}: ffmpeg is not found on PATH");
    }

    is_missing
}

/// Creates a one second video with a sine wave attenuated by `volume` dB.
pub fn create_test_video(path: &Path, volume: f64) -> Result<()> {
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y"])
        .args(["-f", "lavfi", "-i", "color=c=black:s=64x64:r=10:d=1"])
        .args(["-f", "lavfi", "-i", "sine=frequency=440:sample_rate=44100:duration=1"])
        .args(["-shortest", "-c:v", "mpeg4", "-c:a", "pcm_s16le"])
        .arg("-af")
        .arg(format!("volume={volume}dB"))
        .arg(path)
        .stdout(Stdio::null())
        .status()?;

    ensure!(status.success(), "ffmpeg failed: {status}");

    Ok(())
}
