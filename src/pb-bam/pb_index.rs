extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate pbchunk;

use clap::{App, Arg};

use pbchunk::index_build::CLI;

fn main() {
    let matches = App::new("pb-index")
        .version("1.0")
        .author("Nick Ingolia <ingolia@berkeley.edu>")
        .about("Write the PacBio index (.pbi) for a BAM file")
        .arg(
            Arg::with_name("bam_input")
                .short("i")
                .long("input")
                .value_name("INPUT.BAM")
                .help("PacBio BAM file")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("OUTPUT.PBI")
                .help("Index filename (default INPUT.BAM.pbi)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Report on indexing"),
        )
        .get_matches();

    let level = if matches.is_present("verbose") { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = CLI {
        input_bam: matches.value_of("bam_input").unwrap().to_string(),
        output_index: matches.value_of("output").map(String::from),
    };

    match cli.run() {
        Ok(_) => (),
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    }
}
