pub mod cli;
pub mod commands;
pub mod error;

pub mod core {
    pub mod cluster;
    pub mod format;
    pub mod header;
    pub mod provenance;
    pub mod record;
}

pub mod io {
    pub mod readers;
    pub mod record_reader;
    pub mod record_writer;
}

pub mod utils {
    pub mod util;
}

pub mod constants;

pub use constants::*;
