use std::process::exit;

use structopt::StructOpt;

use eagle::cli::{run, Opt};

pub fn main() {
    let opt = Opt::from_args();

    let level = if opt.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .unwrap();

    exit(match run(opt) {
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
        _ => 0,
    })
}
