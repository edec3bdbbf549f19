//! Ingestion sources: local files and a single best-effort HTTP GET.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::error::CrossoverError;
use crate::ports::source_port::SourcePort;

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SourcePort for FileSource {
    fn fetch_text(&self) -> Result<String, CrossoverError> {
        fs::read_to_string(&self.path).map_err(|e| CrossoverError::Fetch {
            location: self.describe(),
            reason: e.to_string(),
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

pub struct HttpSource {
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn fetch_error(&self, reason: impl ToString) -> CrossoverError {
        CrossoverError::Fetch {
            location: self.url.clone(),
            reason: reason.to_string(),
        }
    }
}

impl SourcePort for HttpSource {
    /// Must not be called from inside an async runtime; the blocking client
    /// owns its own.
    fn fetch_text(&self) -> Result<String, CrossoverError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| self.fetch_error(e))?;

        let response = client
            .get(&self.url)
            .send()
            .map_err(|e| self.fetch_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.fetch_error(format!("HTTP {status}")));
        }

        response.text().map_err(|e| self.fetch_error(e))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn file_source_reads_contents() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "2025-01-01,11,12,9,10,1000\n").unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(source.fetch_text().unwrap(), "2025-01-01,11,12,9,10,1000\n");
        assert_eq!(source.describe(), file.path().display().to_string());
    }

    #[test]
    fn file_source_missing_file_is_fetch_error() {
        let source = FileSource::new("/nonexistent/path/bars.csv");
        match source.fetch_text() {
            Err(CrossoverError::Fetch { location, .. }) => {
                assert_eq!(location, "/nonexistent/path/bars.csv")
            }
            other => panic!("expected Fetch, got {other:?}"),
        }
    }

    #[test]
    fn http_source_invalid_url_is_fetch_error() {
        let source = HttpSource::new("not a url").with_timeout(Duration::from_secs(1));
        assert!(matches!(
            source.fetch_text(),
            Err(CrossoverError::Fetch { .. })
        ));
    }
}
