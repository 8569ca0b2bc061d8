use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use crate::error::{PlayerError, Result};

pub(super) fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path).map_err(|e| PlayerError::io(path, e))?;
    Decoder::new(BufReader::new(file))
        .map_err(|e| PlayerError::Engine(format!("cannot decode {}: {e}", path.display())))
}

/// A paused `Sink` for `path`, positioned at `start_at`.
pub(super) fn create_sink_at(stream: &OutputStream, path: &Path, start_at: Duration) -> Result<Sink> {
    // `skip_duration` is the only seek primitive; Duration::ZERO is a no-op.
    let source = open_decoder(path)?.skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.pause();
    sink.append(source);
    Ok(sink)
}
