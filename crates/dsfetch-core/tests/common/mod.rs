#![allow(dead_code)]

pub mod archive_server;

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use dsfetch_core::progress::{EventKind, ProgressEvent, ProgressSink, SharedSink, Subject};

/// Builds an in-memory zip with stored (uncompressed) text entries.
pub fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Records every event and the number of dataset jobs running at once.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<ProgressEvent>>,
    running: Mutex<(usize, usize)>,
}

impl EventLog {
    pub fn shared() -> (Arc<EventLog>, SharedSink) {
        let log = Arc::new(EventLog::default());
        let sink: SharedSink = log.clone();
        (log, sink)
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Highest number of datasets between their Started and terminal events.
    pub fn peak_running_datasets(&self) -> usize {
        self.running.lock().unwrap().1
    }

    pub fn count(&self, kind: &EventKind, pred: impl Fn(&Subject) -> bool) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.kind == kind && pred(&e.subject))
            .count()
    }
}

impl ProgressSink for EventLog {
    fn emit(&self, event: ProgressEvent) {
        if let Subject::Dataset { .. } = event.subject {
            let mut running = self.running.lock().unwrap();
            match event.kind {
                EventKind::Started => {
                    running.0 += 1;
                    running.1 = running.1.max(running.0);
                }
                EventKind::Done | EventKind::Failed => running.0 -= 1,
                _ => {}
            }
        }
        self.events.lock().unwrap().push(event);
    }
}
