//! Terminal output for progress events.
//!
//! One task owns all display state. Status changes print immediately;
//! byte and entry progress is throttled per subject.

use dsfetch_core::progress::{fraction, EventKind, ProgressEvent, Subject};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

const PROGRESS_INTERVAL_MS: u64 = 500;

#[derive(Debug, Default)]
pub struct Presenter {
    last_progress: HashMap<String, Instant>,
}

/// A formatted line and whether it belongs on stderr.
#[derive(Debug, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub is_error: bool,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prints events until every sender is dropped.
    pub async fn drain(mut self, mut rx: UnboundedReceiver<ProgressEvent>) {
        while let Some(event) = rx.recv().await {
            if let Some(line) = self.line(&event, Instant::now()) {
                if line.is_error {
                    eprintln!("{}", line.text);
                } else {
                    println!("{}", line.text);
                }
            }
        }
    }

    /// Formats `event`, or returns None when it is throttled away.
    pub fn line(&mut self, event: &ProgressEvent, now: Instant) -> Option<Line> {
        let key = event.subject.to_string();
        let text = match &event.kind {
            EventKind::Progress { done, total } => {
                if !self.due(&key, now, *done, *total) {
                    return None;
                }
                progress_text(&event.subject, *done, *total)?
            }
            EventKind::Started => {
                self.last_progress.insert(key, now);
                match &event.subject {
                    Subject::Dataset { name } => format!("==> {}: started", name),
                    Subject::Download { file } => format!("  downloading {}", file),
                    Subject::Extract { archive } => format!("  extracting {}", archive.display()),
                    other => format!("  {}: started", other),
                }
            }
            EventKind::Skipped => {
                format!("  {}: already exists, skipping", subject_label(&event.subject))
            }
            EventKind::Done => {
                self.last_progress.remove(&key);
                match &event.subject {
                    Subject::Dataset { name } => format!("==> {}: done", name),
                    Subject::Remove { archive } => format!("  removed {}", archive.display()),
                    other => with_detail(format!("  {}: done", subject_label(other)), event),
                }
            }
            EventKind::Failed => {
                self.last_progress.remove(&key);
                let text = match &event.subject {
                    Subject::Dataset { name } => format!("!! {}: failed", name),
                    other => format!("  ! {}: failed", other),
                };
                return Some(Line {
                    text: with_detail(text, event),
                    is_error: true,
                });
            }
        };
        Some(Line {
            text,
            is_error: false,
        })
    }

    /// Completion always prints; otherwise at most once per interval per subject.
    fn due(&mut self, key: &str, now: Instant, done: u64, total: Option<u64>) -> bool {
        let finished = total.map_or(false, |t| done >= t);
        let interval = Duration::from_millis(PROGRESS_INTERVAL_MS);
        let due = match self.last_progress.get(key) {
            Some(last) => finished || now.duration_since(*last) >= interval,
            None => true,
        };
        if due {
            self.last_progress.insert(key.to_string(), now);
        }
        due
    }
}

fn subject_label(subject: &Subject) -> String {
    match subject {
        Subject::Download { file } => file.clone(),
        Subject::Extract { archive } | Subject::Remove { archive } => {
            archive.display().to_string()
        }
        other => other.to_string(),
    }
}

fn with_detail(text: String, event: &ProgressEvent) -> String {
    match &event.detail {
        Some(detail) => format!("{} ({})", text, detail),
        None => text,
    }
}

fn progress_text(subject: &Subject, done: u64, total: Option<u64>) -> Option<String> {
    match subject {
        Subject::Download { file } => {
            let done_mib = done as f64 / 1_048_576.0;
            Some(match (total, fraction(done, total)) {
                (Some(total), Some(f)) => format!(
                    "  {}: {:.1} / {:.1} MiB ({:.1}%)",
                    file,
                    done_mib,
                    total as f64 / 1_048_576.0,
                    f * 100.0
                ),
                _ => format!("  {}: {:.1} MiB", file, done_mib),
            })
        }
        Subject::Extract { archive } => Some(match total {
            Some(total) => format!("  {}: {} / {} entries", archive.display(), done, total),
            None => format!("  {}: {} entries", archive.display(), done),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(file: &str, done: u64, total: Option<u64>) -> ProgressEvent {
        ProgressEvent::new(EventKind::Progress { done, total }, Subject::download(file))
    }

    #[test]
    fn progress_is_throttled_per_download() {
        let mut p = Presenter::new();
        let t0 = Instant::now();
        let total = Some(10 * 1_048_576);

        assert!(p.line(&progress("a.zip", 1, total), t0).is_some());
        assert!(p.line(&progress("a.zip", 2, total), t0 + Duration::from_millis(100)).is_none());
        // Another download has its own clock.
        assert!(p.line(&progress("b.zip", 1, total), t0 + Duration::from_millis(100)).is_some());
        assert!(p.line(&progress("a.zip", 3, total), t0 + Duration::from_millis(600)).is_some());
    }

    #[test]
    fn completion_progress_always_prints() {
        let mut p = Presenter::new();
        let t0 = Instant::now();
        assert!(p.line(&progress("a.zip", 1, Some(4)), t0).is_some());
        let last = p.line(&progress("a.zip", 4, Some(4)), t0).unwrap();
        assert!(last.text.contains("100.0%"), "{}", last.text);
    }

    #[test]
    fn failures_go_to_stderr_with_detail() {
        let mut p = Presenter::new();
        let event = ProgressEvent::new(EventKind::Failed, Subject::download("lm_base.zip"))
            .with_detail("HTTP 404");
        let line = p.line(&event, Instant::now()).unwrap();
        assert!(line.is_error);
        assert_eq!(line.text, "  ! download lm_base.zip: failed (HTTP 404)");
    }

    #[test]
    fn status_lines() {
        let mut p = Presenter::new();
        let now = Instant::now();
        let started = ProgressEvent::new(
            EventKind::Started,
            Subject::Dataset {
                name: "lm".to_string(),
            },
        );
        assert_eq!(p.line(&started, now).unwrap().text, "==> lm: started");

        let skipped = ProgressEvent::new(EventKind::Skipped, Subject::download("lm_models.zip"));
        assert_eq!(
            p.line(&skipped, now).unwrap().text,
            "  lm_models.zip: already exists, skipping"
        );

        let unknown = p.line(&progress("x.zip", 3 * 1_048_576, None), now).unwrap();
        assert_eq!(unknown.text, "  x.zip: 3.0 MiB");
    }
}
