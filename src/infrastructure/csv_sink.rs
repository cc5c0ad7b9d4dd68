// CSV file sink - three append-only logs per session directory
use crate::application::session_sink::{SessionSink, SinkError, SinkProvider};
use crate::domain::alert::Alert;
use crate::domain::sample::{format_timestamp, MotorSample};
use crate::domain::session::is_path_segment;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MEASUREMENTS_FILE: &str = "measurements_session.csv";
pub const REJECTS_FILE: &str = "rejects.csv";
pub const ALERTS_FILE: &str = "analytics_alerts.csv";

pub const MEASUREMENTS_HEADER: &str = "Timestamp,Iq,Id,Coolant,ProfileId,Ambient,Torque";
pub const REJECTS_HEADER: &str = "Reason,Line";
pub const ALERTS_HEADER: &str = "Timestamp,AlertType,Message,Value,Threshold";

/// Keep free text from splitting a row into extra columns
pub fn sanitize_field(text: &str) -> String {
    text.replace(',', ";")
}

/// Creates `<root>/<session_id>/` with fresh log files
#[derive(Debug, Clone)]
pub struct CsvSinkProvider {
    root: PathBuf,
}

impl CsvSinkProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SinkProvider for CsvSinkProvider {
    fn open(&self, session_id: &str) -> Result<Box<dyn SessionSink>, SinkError> {
        if !is_path_segment(session_id) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("session id {session_id:?} does not name a directory under the storage root"),
            )
            .into());
        }
        let dir = self.root.join(session_id);
        fs::create_dir_all(&dir)?;

        let sink = CsvSessionSink {
            measurements: Some(LogFile::create(&dir.join(MEASUREMENTS_FILE), MEASUREMENTS_HEADER)?),
            rejects: Some(LogFile::create(&dir.join(REJECTS_FILE), REJECTS_HEADER)?),
            alerts: Some(LogFile::create(&dir.join(ALERTS_FILE), ALERTS_HEADER)?),
            dir,
        };
        tracing::debug!(dir = %sink.dir.display(), "opened session logs");
        Ok(Box::new(sink))
    }
}

/// One log file, flushed after every row
struct LogFile {
    writer: BufWriter<File>,
}

impl LogFile {
    fn create(path: &Path, header: &str) -> io::Result<Self> {
        let mut log = Self {
            writer: BufWriter::new(File::create(path)?),
        };
        log.append(header)?;
        Ok(log)
    }

    fn append(&mut self, row: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", row)?;
        self.writer.flush()
    }
}

pub struct CsvSessionSink {
    dir: PathBuf,
    measurements: Option<LogFile>,
    rejects: Option<LogFile>,
    alerts: Option<LogFile>,
}

fn append_to(log: &mut Option<LogFile>, name: &'static str, row: &str) -> Result<(), SinkError> {
    let log = log.as_mut().ok_or(SinkError::Closed(name))?;
    log.append(row)?;
    Ok(())
}

impl SessionSink for CsvSessionSink {
    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    fn record_measurement(&mut self, sample: &MotorSample) -> Result<(), SinkError> {
        append_to(&mut self.measurements, "measurement", &sample.to_record())
    }

    fn record_reject(&mut self, reason: &str, payload: &str) -> Result<(), SinkError> {
        let row = format!("{},{}", sanitize_field(reason), sanitize_field(payload));
        append_to(&mut self.rejects, "reject", &row)
    }

    fn record_alert(&mut self, alert: &Alert) -> Result<(), SinkError> {
        append_to(&mut self.alerts, "alert", &alert_row(alert))
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let mut first_error = None;
        for log in [&mut self.measurements, &mut self.rejects, &mut self.alerts] {
            if let Some(mut file) = log.take() {
                if let Err(e) = file.writer.flush() {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

fn alert_row(alert: &Alert) -> String {
    let precision = alert.kind.precision();
    format!(
        "{},{},{},{:.*},{:.*}",
        format_timestamp(&alert.timestamp),
        alert.kind,
        sanitize_field(&alert.message),
        precision,
        alert.value,
        precision,
        alert.threshold
    )
}
