// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::{io::Write, process::exit};

use clap::Parser;

use env_logger::Env;
use video_normalizer::normalizer::{normalize, Setting};

fn initialize_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buffer, record| writeln!(buffer, "{}", record.args()))
        .init();
}

fn main() {
    initialize_logging();

    if let Err(error) = normalize(&Setting::parse()) {
        // Printed regardless of the log filter.
        eprintln!("ERROR: {error}, exiting!");

        exit(1);
    }
}
