//! # Stream Tables
//!
//! One append-only table per stream, stored as `es_<streamId>.log`. Each
//! row is one JSON line `{"seq_num": u64, "data": "<event JSON>"}`;
//! `seq_num` is the table's serial key, starting at 1.
//!
//! A row is committed once its trailing newline is on disk. A torn last
//! line (crash mid-append) is ignored by readers and cut off by
//! [`Table::recover`] before the next insert.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Prefix of every table name.
pub const TABLE_PREFIX: &str = "es_";

/// File extension of table files.
pub const TABLE_EXT: &str = "log";

/// Prefix of every insert-notification channel.
pub const CHANNEL_PREFIX: &str = "newevent_";

/// One stored row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub seq_num: u64,
    pub data: String,
}

/// `es_<streamId>`
pub fn table_name(stream_id: &str) -> String {
    format!("{}{}", TABLE_PREFIX, stream_id)
}

/// `newevent_es_<streamId>`
pub fn channel_name(stream_id: &str) -> String {
    format!("{}{}", CHANNEL_PREFIX, table_name(stream_id))
}

/// Inverse of [`channel_name`].
pub fn stream_id_from_channel(channel: &str) -> Option<&str> {
    channel
        .strip_prefix(CHANNEL_PREFIX)
        .and_then(|table| table.strip_prefix(TABLE_PREFIX))
}

/// Stream id of a table file name, if it is one.
pub fn stream_id_from_file_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(TABLE_PREFIX)
        .and_then(|rest| rest.strip_suffix(TABLE_EXT))
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|id| !id.is_empty())
}

/// Handle on one table file. Holds no open descriptor.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
}

impl Table {
    pub fn new(root: &Path, stream_id: &str) -> Self {
        Self {
            path: root.join(format!("{}.{}", table_name(stream_id), TABLE_EXT)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> io::Result<bool> {
        tokio::fs::try_exists(&self.path).await
    }

    /// Create the table. `Ok(false)` if it already exists.
    pub async fn create(&self) -> io::Result<bool> {
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await
        {
            Ok(file) => {
                file.sync_all().await?;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Append `data` as rows `first_seq..`, in one write. Never creates.
    ///
    /// Returns the `seq_num` of the last row.
    pub async fn insert(&self, first_seq: u64, data: &[String]) -> io::Result<u64> {
        let mut buf = Vec::new();
        let mut seq = first_seq;
        for item in data {
            let row = Row {
                seq_num: seq,
                data: item.clone(),
            };
            serde_json::to_writer(&mut buf, &row)?;
            buf.push(b'\n');
            seq += 1;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(seq - 1)
    }

    /// Every committed row, in order.
    pub async fn select_all(&self) -> io::Result<Vec<Row>> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        parse_rows(&contents)
    }

    /// Committed rows with `seq_num > after`.
    pub async fn select_after(&self, after: u64) -> io::Result<Vec<Row>> {
        let mut rows = self.select_all().await?;
        rows.retain(|row| row.seq_num > after);
        Ok(rows)
    }

    /// Cut off a torn last line and return the last committed `seq_num`
    /// (0 for an empty table).
    pub async fn recover(&self) -> io::Result<u64> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let committed = match contents.rfind('\n') {
            Some(idx) => idx + 1,
            None => 0,
        };
        if committed < contents.len() {
            tracing::warn!(
                table = %self.path.display(),
                dropped_bytes = contents.len() - committed,
                "Truncating torn row"
            );
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .open(&self.path)
                .await?;
            file.set_len(committed as u64).await?;
            file.sync_all().await?;
        }
        let rows = parse_rows(&contents[..committed])?;
        Ok(rows.last().map_or(0, |row| row.seq_num))
    }

    /// Remove the table. `Ok(false)` if it did not exist.
    pub async fn drop_table(&self) -> io::Result<bool> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn parse_rows(contents: &str) -> io::Result<Vec<Row>> {
    let committed = match contents.rfind('\n') {
        Some(idx) => &contents[..idx],
        None => "",
    };
    committed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str::<Row>(line)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        })
        .collect()
}
