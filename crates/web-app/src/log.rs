use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Local, TimeZone};
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use serde::{Deserialize, Serialize};

/// Maximum number of persisted entries.
pub const LOG_LIMIT: usize = 100;

pub static LOG: Mutex<Option<Arc<Mutex<dyn Repository>>>> = Mutex::new(None);

pub trait Service {
    fn get_log_entries(&self) -> Result<VecDeque<Entry>, Error>;
    fn add_log_entry(&self, entry: Entry) -> Result<(), Error>;
}

pub trait Repository: Send + Sync + 'static {
    fn read_entries(&self) -> Result<VecDeque<Entry>, Error>;
    fn write_entry(&self, entry: Entry) -> Result<(), Error>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Unknown(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Entry {
    pub time: String,
    #[serde(with = "LevelDef")]
    pub level: Level,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
#[serde(remote = "Level")]
pub enum LevelDef {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Insert an entry in front of the existing entries and drop the oldest ones.
pub fn prepend(entries: &mut VecDeque<Entry>, entry: Entry) {
    entries.push_front(entry);
    entries.truncate(LOG_LIMIT);
}

fn timestamp<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%b %d %H:%M:%S").to_string()
}

static LOGGER: Logger = Logger;

/// # Errors
///
/// Returns an error if the logger has already been initialized.
pub fn init(storage: Arc<Mutex<dyn Repository>>) -> Result<(), SetLoggerError> {
    if let Ok(mut log) = LOG.lock() {
        *log = Some(storage);
    }
    log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Debug))
}

struct Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = record.args().to_string();
        match record.level() {
            Level::Error => gloo_console::error!(message.clone()),
            Level::Warn => gloo_console::warn!(message.clone()),
            Level::Info => gloo_console::info!(message.clone()),
            Level::Debug | Level::Trace => gloo_console::debug!(message.clone()),
        }

        let Ok(log) = LOG.lock() else {
            return;
        };
        if let Some(ref repository) = *log {
            if let Ok(repository) = repository.lock() {
                let _ = repository.write_entry(Entry {
                    time: timestamp(&Local::now()),
                    level: record.level(),
                    message,
                });
            }
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(n: usize) -> Entry {
        Entry {
            time: String::from("Jan 01 00:00:00"),
            level: Level::Info,
            message: n.to_string(),
        }
    }

    #[test]
    fn test_timestamp() {
        let time = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 8, 5, 9).unwrap();
        assert_eq!(timestamp(&time), "Jun 01 08:05:09");
        assert_eq!(timestamp(&Local::now()).len(), "Jun 01 08:05:09".len());
    }

    #[test]
    fn test_prepend() {
        let mut entries = VecDeque::new();
        prepend(&mut entries, entry(1));
        prepend(&mut entries, entry(2));
        assert_eq!(entries, VecDeque::from([entry(2), entry(1)]));
    }

    #[test]
    fn test_prepend_limit() {
        let mut entries = (0..LOG_LIMIT).map(entry).collect::<VecDeque<_>>();
        prepend(&mut entries, entry(LOG_LIMIT));
        assert_eq!(entries.len(), LOG_LIMIT);
        assert_eq!(entries.front(), Some(&entry(LOG_LIMIT)));
        assert_eq!(entries.back(), Some(&entry(LOG_LIMIT - 2)));
    }
}
