//! Transcript output: console plus optional file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use murmur_stt::Segment;

/// Format a centisecond tick as `MM:SS.mmm`.
///
/// `500 -> "00:05.000"`, `6000 -> "01:00.000"`.
pub fn format_timestamp(t_cs: i64) -> String {
    let t = t_cs.max(0);
    let msec = (t % 100) * 10;
    let sec_total = t / 100;
    let min = sec_total / 60;
    let sec = sec_total % 60;
    format!("{min:02}:{sec:02}.{msec:03}")
}

/// Consumes finalized segments, writing to the console and optionally
/// appending to a transcript file. Both targets are flushed at the end of
/// each chunk; only the controller thread ever writes.
pub struct TranscriptSink {
    console: Box<dyn Write + Send>,
    file: Option<BufWriter<File>>,
}

impl TranscriptSink {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(console: Box<dyn Write + Send>) -> Self {
        Self {
            console,
            file: None,
        }
    }

    /// Attach a transcript file, created (or truncated) up front so an
    /// unwritable path fails at startup rather than mid-run.
    pub fn open_output_file(&mut self, path: impl AsRef<Path>) -> io::Result<()> {
        let file = File::create(path.as_ref())?;
        self.file = Some(BufWriter::new(file));
        Ok(())
    }

    /// Write one segment, with `[start --> end]` timestamps unless
    /// suppressed, and the speaker-turn marker when the engine signals one.
    pub fn write_segment(&mut self, segment: &Segment, with_timestamps: bool) -> io::Result<()> {
        if with_timestamps {
            let mut line = format!(
                "[{} --> {}]  {}",
                format_timestamp(segment.start_cs),
                format_timestamp(segment.end_cs),
                segment.text
            );
            if segment.speaker_turn_next {
                line.push_str(" [SPEAKER_TURN]");
            }
            self.write_line(&line)
        } else {
            self.write_line(&segment.text)
        }
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.console, "{line}")?;
        if let Some(file) = &mut self.file {
            writeln!(file, "{line}")?;
        }
        Ok(())
    }

    /// Finish a chunk: blank separator line in the file, flush everywhere.
    pub fn end_chunk(&mut self) -> io::Result<()> {
        self.console.flush()?;
        if let Some(file) = &mut self.file {
            writeln!(file)?;
            file.flush()?;
        }
        Ok(())
    }
}
