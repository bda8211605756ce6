// src/grouping.rs
//! Splits a record stream into groups of consecutive records that share a grouping value.
//!
//! The partitioner works in a single forward pass and never sorts. The input is expected to
//! be clustered by the grouping column already: when a value shows up again after a
//! different one, it starts a new, separate group.

use crate::error::{ReportError, Result};
use crate::source::Record;
use std::mem;
use std::path::PathBuf;

/// A maximal run of consecutive records with the same grouping value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: String,
    /// Records reduced to the configured columns they actually contain.
    pub records: Vec<Record>,
}

enum State {
    AwaitingFirst,
    InGroup { key: String, buffer: Vec<Record> },
    Done,
}

/// Iterator adapter turning `Result<Record>` items into `Result<Group>` items.
///
/// An upstream error is passed through and ends the iteration.
pub struct GroupPartitioner<'a, I> {
    records: I,
    grouping_column: &'a str,
    columns: &'a [String],
    source_name: PathBuf,
    state: State,
}

impl<'a, I> GroupPartitioner<'a, I>
where
    I: Iterator<Item = Result<Record>>,
{
    pub fn new(
        records: I,
        grouping_column: &'a str,
        columns: &'a [String],
        source_name: impl Into<PathBuf>,
    ) -> Self {
        Self {
            records,
            grouping_column,
            columns,
            source_name: source_name.into(),
            state: State::AwaitingFirst,
        }
    }

    fn project(&self, record: &Record) -> Record {
        self.columns
            .iter()
            .filter_map(|col| record.get(col).map(|v| (col.clone(), v.clone())))
            .collect()
    }

    fn flush(&mut self) -> Option<Group> {
        match mem::replace(&mut self.state, State::Done) {
            State::InGroup { key, buffer } if !buffer.is_empty() => Some(Group {
                key,
                records: buffer,
            }),
            _ => None,
        }
    }
}

impl<'a, I> Iterator for GroupPartitioner<'a, I>
where
    I: Iterator<Item = Result<Record>>,
{
    type Item = Result<Group>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if matches!(self.state, State::Done) {
                return None;
            }

            let record = match self.records.next() {
                Some(Ok(record)) => record,
                Some(Err(err)) => {
                    self.state = State::Done;
                    return Some(Err(err));
                }
                None => return self.flush().map(Ok),
            };

            let projected = self.project(&record);
            match &mut self.state {
                State::AwaitingFirst => {
                    let Some(key) = record.get(self.grouping_column) else {
                        self.state = State::Done;
                        return Some(Err(ReportError::MissingColumn {
                            column: self.grouping_column.to_string(),
                            file: self.source_name.clone(),
                        }));
                    };
                    self.state = State::InGroup {
                        key: key.clone(),
                        buffer: vec![projected],
                    };
                }
                State::InGroup { key, buffer } => {
                    let value = record
                        .get(self.grouping_column)
                        .map(String::as_str)
                        .unwrap_or("");
                    if value != key.as_str() && !buffer.is_empty() {
                        let finished = Group {
                            key: mem::replace(key, value.to_string()),
                            records: mem::replace(buffer, vec![projected]),
                        };
                        return Some(Ok(finished));
                    }
                    buffer.push(projected);
                }
                State::Done => return None,
            }
        }
    }
}
