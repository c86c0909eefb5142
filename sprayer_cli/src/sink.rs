//! `ProgramSink` implementations: a file store and a stdout stream.

use std::io::Write;
use std::path::PathBuf;

use sprayer_traits::ProgramSink;

/// Persists each submitted program as `<dir>/<name>`.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ProgramSink for FileSink {
    fn submit(
        &mut self,
        name: &str,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let path = self.dir.join(name);
        std::fs::write(&path, text).map_err(|e| format!("write {}: {e}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = text.len(), "program stored");
        Ok(())
    }
}

/// Streams program text to stdout, standing in for a direct controller link.
#[derive(Default)]
pub struct StdoutSink;

impl ProgramSink for StdoutSink {
    fn submit(
        &mut self,
        name: &str,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut out = std::io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()?;
        tracing::debug!(name, bytes = text.len(), "program streamed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_writes_under_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path());
        sink.submit("spray.gcode", "G28\nM84\n").unwrap();
        let back = std::fs::read_to_string(dir.path().join("spray.gcode")).unwrap();
        assert_eq!(back, "G28\nM84\n");
    }

    #[test]
    fn file_sink_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("nope"));
        let err = sink.submit("spray.gcode", "G28\n").unwrap_err();
        assert!(err.to_string().contains("write"));
    }
}
