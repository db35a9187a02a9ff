//! Record reader, one per input file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::entry::Contact;
use crate::shuffle::Router;

/// What a single reader saw in its file.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FileStats {
    pub path: PathBuf,
    pub lines: u64,
    pub contacts: u64,
    pub skipped: u64,
    /// Set when the file could not be opened or a read failed part way.
    pub error: Option<String>,
}

impl FileStats {
    fn new(path: &Path) -> FileStats {
        FileStats {
            path: path.to_path_buf(),
            ..FileStats::default()
        }
    }
}

/// Read every record of `path` into the router.
///
/// Never fails: an unreadable file yields stats with zero contacts and the
/// error message recorded.
pub fn read_file(path: &Path, router: &Router) -> FileStats {
    let mut stats = FileStats::new(path);

    match File::open(path) {
        Ok(file) => read_records(BufReader::new(file), router, &mut stats),
        Err(err) => {
            log::warn!("Skip unreadable file {}, cause: {}", path.display(), err);
            stats.error = Some(err.to_string());
        }
    }

    stats
}

pub(crate) fn read_records<R: BufRead>(mut source: R, router: &Router, stats: &mut FileStats) {
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();

        match source.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => (),
            Err(err) => {
                log::warn!(
                    "Stop reading {} after {} lines, cause: {}",
                    stats.path.display(),
                    stats.lines,
                    err
                );
                stats.error = Some(err.to_string());
                break;
            }
        }

        stats.lines += 1;

        let line = String::from_utf8_lossy(strip_terminator(&buf));

        let contact = match Contact::parse(&line) {
            Some(contact) => contact,
            None => {
                stats.skipped += 1;
                continue;
            }
        };

        if router.route(contact).is_err() {
            log::error!(
                "Shard aggregator is gone, stop reading {}.",
                stats.path.display()
            );
            break;
        }

        stats.contacts += 1;
    }
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
