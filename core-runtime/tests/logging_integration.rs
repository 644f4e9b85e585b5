//! Integration tests for logging system

use core_runtime::logging::{
    init_logging, strip_path, LogEntry, LogFormat, LogLevel, LoggerSink, LoggingConfig,
};
use core_runtime::Error;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl LoggerSink for CollectingSink {
    fn log(&self, entry: LogEntry) {
        self.entries.lock().unwrap().push(entry);
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// Only one subscriber can be installed per process, so everything that
// needs the global subscriber lives in this test.
#[test]
fn test_init_logging_installs_sink_once() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config.clone()).unwrap();

    thread::Builder::new()
        .name("lyrebird-playback".into())
        .spawn(|| {
            tracing::info!(target: "core_playback::controller", position = 2_u64, "Now playing");
            tracing::trace!(target: "core_playback::controller", "filtered out");
        })
        .unwrap()
        .join()
        .unwrap();

    let entries = sink.entries.lock().unwrap();
    let entry = entries
        .iter()
        .find(|entry| entry.message == "Now playing")
        .expect("event forwarded to sink");
    assert_eq!(entry.level, LogLevel::Info);
    assert_eq!(entry.fields.get("position"), Some(&"2".to_string()));
    assert!(entries.iter().all(|entry| entry.message != "filtered out"));
    drop(entries);

    assert!(matches!(init_logging(config), Err(Error::Config(_))));
}

#[test]
fn test_path_stripping() {
    // Unix paths
    assert_eq!(strip_path("/home/user/music/song.mp3"), "song.mp3");
    assert_eq!(strip_path("/var/log/app.log"), "app.log");

    // Windows paths
    assert_eq!(strip_path("C:\\Users\\John\\Music\\song.mp3"), "song.mp3");

    // Edge cases
    assert_eq!(strip_path("/var/log/"), "");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_log_level_ordering() {
    assert!(LogLevel::Trace < LogLevel::Debug);
    assert!(LogLevel::Warn < LogLevel::Error);
    assert_eq!(LogLevel::from(tracing::Level::WARN), LogLevel::Warn);
}
