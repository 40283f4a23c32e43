//! Forward scan of one log file from a located offset.

use std::io::{self, BufRead, Seek, SeekFrom};

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::locate::trim_line;
use crate::query;
use crate::types::{LogRecord, Query, RetrievalRequest};

/// Number of records a retrieval may still return, shared across all the
/// files it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    remaining: usize,
}

impl Budget {
    /// Creates a budget of `max` records.
    #[must_use]
    pub const fn new(max: usize) -> Self {
        Self { remaining: max }
    }

    /// Records still allowed.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }

    /// Returns true once no more records may be returned.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    fn spend(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

/// Per-record acceptance rules for a retrieval.
#[derive(Debug, Clone, Copy)]
pub struct ScanFilter<'a> {
    lower: Option<DateTime<Utc>>,
    upper: Option<DateTime<Utc>>,
    transaction_id: Option<&'a str>,
    query: Option<&'a Query>,
}

impl<'a> ScanFilter<'a> {
    /// Builds the filter a request describes.
    #[must_use]
    pub fn from_request(request: &'a RetrievalRequest) -> Self {
        Self {
            lower: request.begin_time,
            upper: request.end_time,
            transaction_id: request.transaction_filter(),
            query: request.query.as_ref(),
        }
    }

    /// Returns true if the record passes the correlation id and query checks.
    ///
    /// Time bounds are not checked here.
    #[must_use]
    pub fn accepts(&self, record: &LogRecord) -> bool {
        if let Some(id) = self.transaction_id {
            if record.transaction_id.as_deref() != Some(id) {
                return false;
            }
        }
        self.query.is_none_or(|q| query::evaluate(q, record))
    }

    /// Reads records from `from` and appends the matches to `out`.
    ///
    /// Stops at the first record past the upper bound or once `budget` is
    /// exhausted. Unparsable lines are skipped. Records already appended stay
    /// in `out` if a read fails part way.
    ///
    /// # Errors
    ///
    /// Returns an error if seeking or reading fails.
    pub fn scan<R: BufRead + Seek>(
        &self,
        reader: &mut R,
        from: u64,
        budget: &mut Budget,
        out: &mut Vec<LogRecord>,
    ) -> io::Result<()> {
        if budget.is_exhausted() {
            return Ok(());
        }

        reader.seek(SeekFrom::Start(from))?;
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                return Ok(());
            }

            let record = match serde_json::from_slice::<LogRecord>(trim_line(&line)) {
                Ok(record) => record,
                Err(e) => {
                    trace!(error = %e, "skipping unparsable log line");
                    continue;
                }
            };

            if self.upper.is_some_and(|upper| record.time > upper) {
                return Ok(());
            }
            if self.lower.is_some_and(|lower| record.time < lower) {
                continue;
            }
            if !self.accepts(&record) {
                continue;
            }

            out.push(record);
            budget.spend();
            if budget.is_exhausted() {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).expect("valid timestamp")
    }

    fn file_of(records: &[LogRecord]) -> Cursor<Vec<u8>> {
        let mut bytes = Vec::new();
        for record in records {
            bytes.extend(record.to_line().expect("serialize").into_bytes());
        }
        Cursor::new(bytes)
    }

    fn run(
        request: &RetrievalRequest,
        data: &mut Cursor<Vec<u8>>,
        budget: &mut Budget,
    ) -> Vec<LogRecord> {
        let mut out = Vec::new();
        ScanFilter::from_request(request)
            .scan(data, 0, budget, &mut out)
            .expect("in-memory read");
        out
    }

    fn msgs(records: &[LogRecord]) -> Vec<&str> {
        records.iter().map(|r| r.msg.as_str()).collect()
    }

    #[test]
    fn budget_counts_down() {
        let mut budget = Budget::new(2);
        assert_eq!(budget.remaining(), 2);
        budget.spend();
        budget.spend();
        assert!(budget.is_exhausted());
        budget.spend();
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn stops_past_upper_bound() {
        let records: Vec<LogRecord> = (0..10)
            .map(|i| LogRecord::new("info", at(i), format!("m{i}")))
            .collect();
        let mut data = file_of(&records);
        let request = RetrievalRequest::between(at(0), at(4));

        let out = run(&request, &mut data, &mut Budget::new(100));
        assert_eq!(msgs(&out), vec!["m0", "m1", "m2", "m3", "m4"]);
    }

    #[test]
    fn filters_by_transaction_id() {
        let records = vec![
            LogRecord::new("info", at(1), "a").with_transaction_id("t1"),
            LogRecord::new("info", at(2), "b"),
            LogRecord::new("info", at(3), "c").with_transaction_id("t2"),
            LogRecord::new("info", at(4), "d").with_transaction_id("t1"),
        ];
        let mut data = file_of(&records);
        let request = RetrievalRequest::between(at(0), at(10)).with_transaction_id("t1");

        let out = run(&request, &mut data, &mut Budget::new(100));
        assert_eq!(msgs(&out), vec!["a", "d"]);
    }

    #[test]
    fn filters_by_query() {
        let records = vec![
            LogRecord::new("info", at(1), "log 1"),
            LogRecord::new("info", at(2), "log 3"),
            LogRecord::new("error", at(3), "log 3"),
        ];
        let mut data = file_of(&records);
        let request =
            RetrievalRequest::between(at(0), at(10)).with_query(Query::equals("level", "error"));

        let out = run(&request, &mut data, &mut Budget::new(100));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].time, at(3));
    }

    #[test]
    fn stops_when_budget_exhausted() {
        let records: Vec<LogRecord> = (0..10)
            .map(|i| LogRecord::new("info", at(i), format!("m{i}")))
            .collect();
        let mut data = file_of(&records);
        let request = RetrievalRequest::default();
        let mut budget = Budget::new(3);

        let out = run(&request, &mut data, &mut budget);
        assert_eq!(msgs(&out), vec!["m0", "m1", "m2"]);
        assert!(budget.is_exhausted());

        let again = run(&request, &mut data, &mut budget);
        assert!(again.is_empty());
    }

    #[test]
    fn skips_malformed_lines_and_partial_tail() {
        let mut data = file_of(&[LogRecord::new("info", at(1), "first")]);
        data.get_mut().extend_from_slice(b"garbage\n{\"level\":\"info\",\"msg\":\"no time\"}\n");
        data.get_mut()
            .extend(LogRecord::new("info", at(2), "second").to_line().expect("serialize").into_bytes());
        data.get_mut().extend_from_slice(b"{\"level\":\"info\",\"ti");

        let out = run(&RetrievalRequest::default(), &mut data, &mut Budget::new(100));
        assert_eq!(msgs(&out), vec!["first", "second"]);
    }

    #[test]
    fn scans_from_offset() {
        let records: Vec<LogRecord> = (0..4)
            .map(|i| LogRecord::new("info", at(i), format!("m{i}")))
            .collect();
        let mut data = file_of(&records);
        let offset = records[0].to_line().expect("serialize").len() as u64;

        let mut out = Vec::new();
        ScanFilter::from_request(&RetrievalRequest::default())
            .scan(&mut data, offset, &mut Budget::new(100), &mut out)
            .expect("in-memory read");
        assert_eq!(msgs(&out), vec!["m1", "m2", "m3"]);
    }
}
