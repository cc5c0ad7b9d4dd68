// Line reader feeding the decoder, with a client-side reject log
use crate::domain::decoder::{decode, is_header};
use crate::domain::sample::MotorSample;
use crate::infrastructure::csv_sink::sanitize_field;
use anyhow::Context;
use chrono::Utc;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub struct SampleReader<R, W> {
    source: R,
    buf: Vec<u8>,
    rejects: W,
    header_checked: bool,
    accepted: usize,
    rejected: usize,
}

impl SampleReader<BufReader<File>, BufWriter<File>> {
    /// Open a CSV source and create (truncate) its reject log
    pub fn open(csv_path: &Path, reject_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = reject_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let source = File::open(csv_path)
            .with_context(|| format!("Failed to open {}", csv_path.display()))?;
        let rejects = File::create(reject_path)
            .with_context(|| format!("Failed to create {}", reject_path.display()))?;

        Ok(Self::new(BufReader::new(source), BufWriter::new(rejects))?)
    }
}

impl<R: BufRead, W: Write> SampleReader<R, W> {
    pub fn new(source: R, mut rejects: W) -> io::Result<Self> {
        writeln!(rejects, "Reason,Line")?;
        rejects.flush()?;
        Ok(Self {
            source,
            buf: Vec::new(),
            rejects,
            header_checked: false,
            accepted: 0,
            rejected: 0,
        })
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Next raw line without its terminator. Bytes that are not UTF-8 become U+FFFD.
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.source.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        if self.buf.ends_with(b"\n") {
            self.buf.pop();
            if self.buf.ends_with(b"\r") {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    /// Next decodable sample; undecodable lines are logged and skipped.
    /// `Ok(None)` at end of input.
    pub fn next_sample(&mut self) -> io::Result<Option<MotorSample>> {
        while let Some(line) = self.next_line()? {

            if !self.header_checked {
                self.header_checked = true;
                if is_header(&line) {
                    tracing::debug!("skipping header line");
                    continue;
                }
            }

            match decode(&line, Utc::now()) {
                Ok(sample) => {
                    self.accepted += 1;
                    return Ok(Some(sample));
                }
                Err(e) => {
                    self.rejected += 1;
                    writeln!(
                        self.rejects,
                        "{},{}",
                        sanitize_field(&e.to_string()),
                        sanitize_field(&line)
                    )?;
                    self.rejects.flush()?;
                    if self.rejected <= 5 {
                        let preview: String = line.chars().take(100).collect();
                        tracing::warn!(error = %e, line = %preview, "rejected line");
                    }
                }
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    fn into_rejects(mut self) -> io::Result<W> {
        self.rejects.flush()?;
        Ok(self.rejects)
    }
}
