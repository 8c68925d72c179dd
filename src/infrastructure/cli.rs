use std::path::PathBuf;

use clap::{builder::RangedU64ValueParser, Parser};

use crate::utils::version;

#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
    /// Session file with one JSON event per line; stdin when omitted
    #[arg(short, long, value_name = "FILE")]
    pub session: Option<PathBuf>,

    /// Sync messages allowed in flight before patches are buffered
    #[arg(
        long,
        value_name = "COUNT",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub msg_throttle: Option<usize>,

    /// Number of notebook cells to start with
    #[arg(short, long, value_name = "COUNT", default_value_t = 1)]
    pub cells: usize,

    /// Print the rendered notebook once the session ends
    #[arg(long, default_value_t = false)]
    pub render: bool,
}
