extern crate byteorder;
extern crate csv;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate rust_htslib;
extern crate serde;
extern crate tempfile;

pub mod boundary;
pub mod errors;
pub mod extract;
pub mod index_build;
pub mod pbi;
pub mod report;
pub mod split;
pub mod virtual_offset;

pub use boundary::{locate_zmw_boundaries, select_chunk_offsets, ZmwBoundary};
pub use errors::ChunkError;
pub use extract::{extract_chunk, BGZF_EOF};
pub use pbi::PbIndex;
pub use split::{split_bam, split_bam_with, SplitOptions, SplitOutcome};
pub use virtual_offset::VirtualOffset;
