use crate::{error::SvlinkError, utils::util::Result};
use flate2::read::MultiGzDecoder;
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read},
    path::Path,
};

/// Opens an input stream for reading. `None` or `-` selects stdin;
/// `.gz`/`.gzip` paths are transparently decompressed after their gzip
/// header has been validated.
pub fn open_input_reader(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    fn is_gzipped(path: &Path) -> bool {
        let path_str = path.to_string_lossy().to_lowercase();
        path_str.ends_with(".gz") || path_str.ends_with(".gzip")
    }

    let path = match path {
        None => return Ok(Box::new(BufReader::new(io::stdin()))),
        Some(path) if path == Path::new("-") => {
            return Ok(Box::new(BufReader::new(io::stdin())))
        }
        Some(path) => path,
    };

    let file = File::open(path)
        .map_err(|error| crate::svlink_error!("Failed to open file {}: {error}", path.display()))?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(Box::new(BufReader::new(Box::new(gz_decoder) as Box<dyn Read>)))
        } else {
            Err(SvlinkError::InvalidGzipHeader {
                path: path.display().to_string(),
            })
        }
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
