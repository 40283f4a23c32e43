//! Binary search for the start of a time window inside one log file.
//!
//! Records within a file are written in non-decreasing `time` order, so the
//! first record at or after a bound can be found by bisecting byte offsets
//! instead of reading the file from the start.

use std::io::{self, BufRead, Seek, SeekFrom};

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Just enough of a record to order it.
#[derive(Deserialize)]
struct TimeProbe {
    time: DateTime<Utc>,
}

/// Parses the `time` of a raw line, or `None` if the line is not a record.
pub(crate) fn parse_time(line: &[u8]) -> Option<DateTime<Utc>> {
    serde_json::from_slice::<TimeProbe>(trim_line(line))
        .ok()
        .map(|probe| probe.time)
}

/// Strips the line terminator and surrounding ASCII whitespace.
pub(crate) fn trim_line(line: &[u8]) -> &[u8] {
    line.trim_ascii()
}

/// Returns the byte offset of the first record whose time is at or after
/// `lower`, or `None` if the file holds no such record.
///
/// `len` is the file size the search covers. Lines that do not parse,
/// including a partially written trailing line, are stepped over.
///
/// # Errors
///
/// Returns an error if seeking or reading fails.
pub fn locate<R: BufRead + Seek>(
    reader: &mut R,
    len: u64,
    lower: DateTime<Utc>,
) -> io::Result<Option<u64>> {
    let mut lo = 0u64;
    let mut hi = len;

    // Smallest offset whose next record is at or past the bound.
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match next_record(reader, mid)? {
            Some((_, time)) if time < lower => lo = mid + 1,
            _ => hi = mid,
        }
    }

    Ok(next_record(reader, lo)?
        .filter(|(_, time)| *time >= lower)
        .map(|(offset, _)| offset))
}

/// Finds the first parseable record whose line starts at or after `offset`.
///
/// Returns the line's start offset and the record's time.
fn next_record<R: BufRead + Seek>(
    reader: &mut R,
    offset: u64,
) -> io::Result<Option<(u64, DateTime<Utc>)>> {
    let mut line = Vec::new();

    // A line starts at 0 or right after a newline. Backing up one byte and
    // discarding through the next newline lands on the first line start at or
    // after `offset`, including `offset` itself.
    let mut pos = if offset == 0 {
        reader.seek(SeekFrom::Start(0))?
    } else {
        let back = offset - 1;
        reader.seek(SeekFrom::Start(back))?;
        let skipped = reader.read_until(b'\n', &mut line)?;
        back + skipped as u64
    };

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            return Ok(None);
        }
        if let Some(time) = parse_time(&line) {
            return Ok(Some((pos, time)));
        }
        pos += read as u64;
    }
}
