//! Streaming GET with libcurl into a `.part` file.

use curl::easy::{Easy, List};
use std::io;
use std::path::Path;

use crate::config::FetchSettings;
use crate::error::FetchError;
use crate::progress::{EventKind, ProgressEvent, ProgressSink, Subject};
use crate::storage::PartFile;

/// Downloads `url` to `final_path` via its temp file. Returns bytes written.
/// Nothing is left at either path when this returns Err.
/// Blocks the current thread; call from `spawn_blocking` in async code.
pub(super) fn download_to(
    url: &str,
    final_path: &Path,
    settings: &FetchSettings,
    sink: &dyn ProgressSink,
    file_name: &str,
) -> Result<u64, FetchError> {
    let io_err = |path: &Path, source: io::Error| FetchError::Io {
        url: url.to_string(),
        path: path.to_path_buf(),
        source,
    };

    let mut part = PartFile::create(final_path).map_err(|e| io_err(final_path, e))?;
    if let Err(e) = perform(url, &mut part, settings, sink, file_name) {
        part.discard();
        return Err(e);
    }
    part.finalize(final_path).map_err(|e| io_err(final_path, e))
}

fn perform(
    url: &str,
    part: &mut PartFile,
    settings: &FetchSettings,
    sink: &dyn ProgressSink,
    file_name: &str,
) -> Result<(), FetchError> {
    let transport = |source: curl::Error| FetchError::Transport {
        url: url.to_string(),
        source,
    };

    let mut easy = Easy::new();
    easy.url(url).map_err(transport)?;
    easy.useragent(&settings.user_agent).map_err(transport)?;
    easy.follow_location(true).map_err(transport)?;
    easy.max_redirections(settings.max_redirects)
        .map_err(transport)?;
    // >= 400 ends the transfer before any body byte reaches the part file.
    easy.fail_on_error(true).map_err(transport)?;
    easy.progress(true).map_err(transport)?;

    if !settings.headers.is_empty() {
        let mut list = List::new();
        for (k, v) in &settings.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))
                .map_err(transport)?;
        }
        easy.http_headers(list).map_err(transport)?;
    }

    let step = settings.progress_step_bytes.max(1);
    let mut next_report = step;
    let mut write_error: Option<io::Error> = None;

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| match part.write_chunk(data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    write_error = Some(e);
                    Ok(0) // abort transfer
                }
            })
            .map_err(transport)?;
        transfer
            .progress_function(|dltotal, dlnow, _, _| {
                let done = dlnow as u64;
                if done >= next_report {
                    let total = (dltotal > 0.0).then(|| dltotal as u64);
                    sink.emit(ProgressEvent::new(
                        EventKind::Progress { done, total },
                        Subject::download(file_name),
                    ));
                    next_report = done + step;
                }
                true
            })
            .map_err(transport)?;
        transfer.perform()
    };

    if let Some(source) = write_error {
        return Err(FetchError::Io {
            url: url.to_string(),
            path: part.temp_path().to_path_buf(),
            source,
        });
    }
    if let Err(e) = performed {
        if e.is_http_returned_error() {
            let status = easy.response_code().unwrap_or(0);
            return Err(FetchError::Http {
                url: url.to_string(),
                status,
            });
        }
        return Err(transport(e));
    }

    let status = easy.response_code().map_err(transport)?;
    if !(200..300).contains(&status) {
        return Err(FetchError::Http {
            url: url.to_string(),
            status,
        });
    }
    Ok(())
}
