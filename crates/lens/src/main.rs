//
// main.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::io::BufRead;
use std::path::Path;

use lens::bridge;
use lens::config::ExplorerConfig;
use lens::logger;
use stdext::unwrap;

fn print_usage() {
    println!("Lens {}, a data explorer for in-memory tables.", env!("CARGO_PKG_VERSION"));
    println!(
        r#"
Usage: lens [OPTIONS]

Reads one JSON command per line from stdin and writes one JSON message per
line to stdout.

Available options:

--config FILE            Read settings from the given JSON file
--log FILE               Log to the given file (if not specified, stderr
                         will be used)
--version                Print the version of Lens
--help                   Print this help message
"#
    );
}

fn main() {
    let mut argv = std::env::args();

    // Skip the first "argument" as it's the path/name to this executable
    argv.next();

    let mut config_file: Option<String> = None;
    let mut log_file: Option<String> = None;

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--config" => {
                if let Some(file) = argv.next() {
                    config_file = Some(file);
                } else {
                    eprintln!("A config file must be specified with the --config argument.");
                    return;
                }
            },
            "--log" => {
                if let Some(file) = argv.next() {
                    log_file = Some(file);
                } else {
                    eprintln!("A log file must be specified with the --log argument.");
                    return;
                }
            },
            "--version" => {
                println!("Lens {}", env!("CARGO_PKG_VERSION"));
                return;
            },
            "--help" => {
                print_usage();
                return;
            },
            other => {
                eprintln!("Argument '{other}' unknown");
                print_usage();
                return;
            },
        }
    }

    logger::initialize(log_file.as_deref());

    let config = match config_file {
        Some(file) => unwrap!(ExplorerConfig::from_file(Path::new(&file)), Err(err) => {
            log::error!("Can't read config file {file}: {err:?}");
            eprintln!("Can't read config file {file}: {err}");
            return;
        }),
        None => ExplorerConfig::default(),
    };
    log::info!("Starting lens {} with {config:?}", env!("CARGO_PKG_VERSION"));

    let stdin = std::io::stdin();
    if let Err(err) = bridge::run(&config, stdin.lock().lines(), std::io::stdout()) {
        log::error!("Lens stopped with an error: {err:?}");
        std::process::exit(1);
    }
}
