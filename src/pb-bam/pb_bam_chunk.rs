extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate pbchunk;

use clap::{App, Arg};

use pbchunk::split::CLI;

fn main() {
    let matches = App::new("pb-bam-chunk")
        .version("1.0")
        .author("Nick Ingolia <ingolia@berkeley.edu>")
        .about("Split an indexed PacBio BAM file into ZMW-safe chunks without recompressing")
        .arg(
            Arg::with_name("bam_input")
                .short("i")
                .long("input")
                .value_name("INPUT.BAM")
                .help("PacBio BAM file, with INPUT.BAM.pbi index")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("outbase")
                .short("o")
                .long("outbase")
                .value_name("OUTBASE")
                .help("Output filename base (chunks in OUTBASE.chunk0.bam, OUTBASE.chunk1.bam, &c.)")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("nchunks")
                .short("n")
                .long("nchunks")
                .value_name("#CHUNKS")
                .help("Maximum number of chunks")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("report")
                .short("r")
                .long("report")
                .value_name("REPORT.TXT")
                .help("Tab-delimited table describing each chunk")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("dry_run")
                .long("dry-run")
                .help("Plan chunks without writing any BAM files"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Verbose report on chunking progress"),
        )
        .get_matches();

    init_logging(matches.occurrences_of("verbose"));

    let cli = CLI {
        input_bam: matches.value_of("bam_input").unwrap().to_string(),
        nchunks: matches.value_of("nchunks").unwrap().to_string(),
        output_prefix: matches.value_of("outbase").unwrap().to_string(),
        report: matches.value_of("report").map(String::from),
        dry_run: matches.is_present("dry_run"),
    };

    match cli.run() {
        Ok(_) => (),
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: u64) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
