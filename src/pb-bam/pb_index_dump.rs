extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate pbchunk;

use clap::{App, Arg};

use pbchunk::report::CLI;

fn main() {
    let matches = App::new("pb-index-dump")
        .version("1.0")
        .author("Nick Ingolia <ingolia@berkeley.edu>")
        .about("Print the contents of a PacBio index as a table")
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .value_name("INPUT.PBI")
                .help("PacBio index file")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("boundaries")
                .short("b")
                .long("boundaries")
                .help("Print only reads where a BAM file can be split between ZMWs"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Report on reading the index"),
        )
        .get_matches();

    let level = if matches.is_present("verbose") { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = CLI {
        input_index: matches.value_of("input").unwrap().to_string(),
        boundaries: matches.is_present("boundaries"),
    };

    match cli.run() {
        Ok(_) => (),
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    }
}
