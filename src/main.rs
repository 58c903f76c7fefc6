// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/main.rs

// Command-line driver: runs a script file or an interactive loop

// <>

use ember::Config;

use std::env;
use std::io;
use std::process::ExitCode;

const USAGE: &str = "usage: ember [--limit <n>] (file <path> | repl)";

fn main() -> ExitCode {
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init()
    {
        eprintln!("logger setup failed: {}", e);
    }

    let mut config = Config::default();
    let mut words: Vec<String> = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg != "--limit" {
            words.push(arg);
            continue;
        }

        match args.next().and_then(|n| n.parse().ok()) {
            Some(limit) => config = config.with_recursion_limit(limit),
            None => {
                log::error!("--limit needs a number");
                return ExitCode::FAILURE;
            }
        }
    }

    // ember file <path> runs a script; ember repl reads from stdin
    match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["file", path] => match ember::run_file(*path, config) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{}", e);
                ExitCode::FAILURE
            }
        },
        ["repl"] => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            match ember::repl(stdin.lock(), &mut stdout.lock(), config) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    log::error!("{}", e);
                    ExitCode::FAILURE
                }
            }
        }
        _ => {
            eprintln!("{}", USAGE);
            ExitCode::FAILURE
        }
    }
}
