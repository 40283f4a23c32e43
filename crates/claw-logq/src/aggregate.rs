//! Cross-file retrieval under a global record cap.

use std::fs::File;
use std::io::{self, BufReader};

use tracing::{debug, warn};

use crate::file_index::{FileIndex, LogFile};
use crate::locate::locate;
use crate::scan::{Budget, ScanFilter};
use crate::types::{LogRecord, RetrievalRequest, RetrievalResult};

/// Collects the records matching `request` across every file of `index`, in
/// chronological order, returning at most `max_records`.
///
/// Rotated files whose rotation instant is earlier than `begin_time` are
/// skipped without being opened; this relies on the writer never putting a
/// record into a file after rotating it. A file that cannot be read is logged
/// and skipped.
#[must_use]
pub fn retrieve(
    index: &FileIndex,
    request: &RetrievalRequest,
    max_records: usize,
) -> RetrievalResult {
    let filter = ScanFilter::from_request(request);
    let mut budget = Budget::new(max_records);
    let mut records = Vec::new();

    for file in index.list() {
        if budget.is_exhausted() {
            break;
        }

        if let (Some(rotated_at), Some(begin)) = (file.rotated_at, request.begin_time) {
            if rotated_at < begin {
                debug!(file = %file.name, "skipping file rotated before the window");
                continue;
            }
        }

        if let Err(e) = read_file(&file, request, &filter, &mut budget, &mut records) {
            warn!(file = %file.path.display(), error = %e, "failed to read log file");
        }
    }

    let truncated = max_records > 0 && records.len() == max_records;
    RetrievalResult { records, truncated }
}

fn read_file(
    file: &LogFile,
    request: &RetrievalRequest,
    filter: &ScanFilter<'_>,
    budget: &mut Budget,
    out: &mut Vec<LogRecord>,
) -> io::Result<()> {
    let handle = File::open(&file.path)?;
    let len = handle.metadata()?.len();
    let mut reader = BufReader::new(handle);

    let from = match request.begin_time {
        Some(begin) => match locate(&mut reader, len, begin)? {
            Some(offset) => offset,
            None => return Ok(()),
        },
        None => 0,
    };

    filter.scan(&mut reader, from, budget, out)
}
