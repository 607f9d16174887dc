//! Durable CSV tape of normalized rows

use crate::flow::{FlowRow, COLUMNS};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Durable log errors
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV encoding failed: {0}")]
    Encode(String),
    #[error("CSV decoding failed: {0}")]
    Decode(#[from] csv::Error),
}

/// Append-only CSV file mirroring the flow table
///
/// All file access goes through one async mutex, so an export never reads
/// a half-written line. Cloning yields another handle to the same file.
#[derive(Debug, Clone)]
pub struct CsvLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl CsvLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with a header row if it does not exist yet
    ///
    /// Returns `true` when a header was written: the file was created, or it
    /// existed but was empty. A non-empty file is never modified; a header
    /// that does not match the expected columns, or cannot be decoded, is
    /// only reported.
    pub async fn initialize(&self) -> Result<bool, LogError> {
        let _guard = self.lock.lock().await;
        self.ensure_parent().await?;

        let created = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await;

        match created {
            Ok(mut file) => {
                let header = header_line()?;
                file.write_all(&header).await.map_err(|e| self.io(e))?;
                file.sync_all().await.map_err(|e| self.io(e))?;
                tracing::info!(path = %self.path.display(), "Created flow tape");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => self.adopt_existing().await,
            Err(e) => Err(self.io(e)),
        }
    }

    /// Append one row as a single CSV line
    ///
    /// If the file has disappeared it is recreated with a header first. On a
    /// failed write the file is cut back to its previous length so a torn
    /// line never precedes the next append.
    pub async fn append(&self, row: &FlowRow) -> Result<(), LogError> {
        let line = encode_row(row)?;
        let _guard = self.lock.lock().await;
        self.ensure_parent().await?;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io(e))?;

        let previous_len = file.metadata().await.map_err(|e| self.io(e))?.len();

        let mut buf = Vec::with_capacity(line.len() + 128);
        if previous_len == 0 {
            tracing::warn!(path = %self.path.display(), "Flow tape missing, rewriting header");
            buf.extend_from_slice(&header_line()?);
        }
        buf.extend_from_slice(&line);

        let written = async {
            file.write_all(&buf).await?;
            file.flush().await?;
            file.sync_data().await?;
            Ok::<(), std::io::Error>(())
        }
        .await;

        self.settle(&mut file, previous_len, written).await
    }

    /// Cut the file back to `previous_len` if the write failed
    async fn settle(
        &self,
        file: &mut File,
        previous_len: u64,
        written: std::io::Result<()>,
    ) -> Result<(), LogError> {
        let Err(e) = written else {
            return Ok(());
        };
        if let Err(truncate_err) = file.set_len(previous_len).await {
            tracing::error!(
                error = %truncate_err,
                path = %self.path.display(),
                "Failed to roll back partial tape write"
            );
        }
        Err(self.io(e))
    }

    /// Current file contents, header included
    pub async fn read_all(&self) -> Result<Vec<u8>, LogError> {
        let _guard = self.lock.lock().await;
        fs::read(&self.path).await.map_err(|e| self.io(e))
    }

    /// Parse the file back into rows, oldest first
    pub async fn read_rows(&self) -> Result<Vec<FlowRow>, LogError> {
        let bytes = self.read_all().await?;
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<FlowRow>, _>>()?;
        Ok(rows)
    }

    /// Copy the file to `dest`; returns the number of bytes copied
    pub async fn copy_to(&self, dest: impl AsRef<Path>) -> Result<u64, LogError> {
        let dest = dest.as_ref();
        let _guard = self.lock.lock().await;
        fs::copy(&self.path, dest).await.map_err(|e| LogError::Io {
            path: dest.to_path_buf(),
            source: e,
        })
    }

    async fn ensure_parent(&self) -> Result<(), LogError> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir).await.map_err(|e| LogError::Io {
                    path: dir.to_path_buf(),
                    source: e,
                })
            }
            _ => Ok(()),
        }
    }

    /// Header an empty leftover file; otherwise just check the header it has
    async fn adopt_existing(&self) -> Result<bool, LogError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io(e))?;

        if file.metadata().await.map_err(|e| self.io(e))?.len() == 0 {
            let header = header_line()?;
            file.write_all(&header).await.map_err(|e| self.io(e))?;
            file.sync_all().await.map_err(|e| self.io(e))?;
            tracing::info!(path = %self.path.display(), "Wrote header to empty flow tape");
            return Ok(true);
        }

        drop(file);
        self.check_header().await?;
        Ok(false)
    }

    async fn check_header(&self) -> Result<(), LogError> {
        let bytes = fs::read(&self.path).await.map_err(|e| self.io(e))?;
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        match reader.headers() {
            Ok(found) if found.iter().eq(COLUMNS.iter().copied()) => {}
            Ok(found) => {
                tracing::warn!(
                    path = %self.path.display(),
                    found = ?found,
                    "Existing flow tape has an unexpected header"
                );
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Existing flow tape header is unreadable"
                );
            }
        }
        Ok(())
    }

    fn io(&self, source: std::io::Error) -> LogError {
        LogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn header_line() -> Result<Vec<u8>, LogError> {
    let mut wtr = writer();
    wtr.write_record(COLUMNS)
        .map_err(|e| LogError::Encode(e.to_string()))?;
    wtr.into_inner().map_err(|e| LogError::Encode(e.to_string()))
}

fn encode_row(row: &FlowRow) -> Result<Vec<u8>, LogError> {
    let mut wtr = writer();
    wtr.serialize(row)
        .map_err(|e| LogError::Encode(e.to_string()))?;
    wtr.into_inner().map_err(|e| LogError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER: &str = "Time,Symbol,Buy/Sell,Strike,Call/Put,Expiry,Premium ($),Type\n";

    fn row(symbol: &str, premium: &str) -> FlowRow {
        FlowRow {
            time: "15:59:58".to_string(),
            symbol: symbol.to_string(),
            side: "Sell".to_string(),
            strike: "250".to_string(),
            option_type: "put".to_string(),
            expiry: "Jan 02".to_string(),
            premium: premium.to_string(),
            action_type: "BLOCK".to_string(),
        }
    }

    #[tokio::test]
    async fn test_initialize_creates_header() {
        let dir = TempDir::new().unwrap();
        let log = CsvLog::new(dir.path().join("flow.csv"));

        assert!(log.initialize().await.unwrap());
        let content = String::from_utf8(log.read_all().await.unwrap()).unwrap();
        assert_eq!(content, HEADER);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let log = CsvLog::new(dir.path().join("flow.csv"));

        assert!(log.initialize().await.unwrap());
        assert!(!log.initialize().await.unwrap());

        let content = String::from_utf8(log.read_all().await.unwrap()).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_initialize_keeps_existing_rows() {
        let dir = TempDir::new().unwrap();
        let log = CsvLog::new(dir.path().join("flow.csv"));
        log.initialize().await.unwrap();
        log.append(&row("AAPL", "$2,500")).await.unwrap();

        log.initialize().await.unwrap();
        assert_eq!(log.read_rows().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_initialize_leaves_foreign_header_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flow.csv");
        std::fs::write(&path, "a,b,c\n1,2,3\n").unwrap();

        let log = CsvLog::new(&path);
        assert!(!log.initialize().await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b,c\n1,2,3\n");
    }

    #[tokio::test]
    async fn test_initialize_writes_header_to_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flow.csv");
        std::fs::write(&path, b"").unwrap();

        let log = CsvLog::new(&path);
        assert!(log.initialize().await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), HEADER);

        assert!(!log.initialize().await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), HEADER);
    }

    #[tokio::test]
    async fn test_initialize_tolerates_undecodable_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flow.csv");
        let garbage = b"\xff\xfe,b\n1,2\n";
        std::fs::write(&path, garbage).unwrap();

        let log = CsvLog::new(&path);
        assert!(!log.initialize().await.unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), garbage);
    }

    #[tokio::test]
    async fn test_initialize_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let log = CsvLog::new(dir.path().join("nested/deeper/flow.csv"));
        log.initialize().await.unwrap();
        assert!(log.path().exists());
    }

    #[tokio::test]
    async fn test_append_preserves_order_and_quotes_commas() {
        let dir = TempDir::new().unwrap();
        let log = CsvLog::new(dir.path().join("flow.csv"));
        log.initialize().await.unwrap();

        log.append(&row("AAPL", "$2,500")).await.unwrap();
        log.append(&row("TSLA", "$900")).await.unwrap();

        let content = String::from_utf8(log.read_all().await.unwrap()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(format!("{}\n", lines[0]), HEADER);
        assert_eq!(
            lines[1],
            "15:59:58,AAPL,Sell,250,put,Jan 02,\"$2,500\",BLOCK"
        );
        assert!(lines[2].contains(",TSLA,"));
    }

    #[tokio::test]
    async fn test_read_rows_round_trips() {
        let dir = TempDir::new().unwrap();
        let log = CsvLog::new(dir.path().join("flow.csv"));
        log.initialize().await.unwrap();

        let first = row("AAPL", "$2,500");
        let second = row("TSLA", "$1,200,000");
        log.append(&first).await.unwrap();
        log.append(&second).await.unwrap();

        assert_eq!(log.read_rows().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_append_recreates_missing_file_with_header() {
        let dir = TempDir::new().unwrap();
        let log = CsvLog::new(dir.path().join("flow.csv"));
        log.initialize().await.unwrap();
        std::fs::remove_file(log.path()).unwrap();

        log.append(&row("SPY", "$10")).await.unwrap();

        let content = String::from_utf8(log.read_all().await.unwrap()).unwrap();
        assert!(content.starts_with(HEADER));
        assert_eq!(log.read_rows().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_is_rolled_back() {
        let dir = TempDir::new().unwrap();
        let log = CsvLog::new(dir.path().join("flow.csv"));
        log.initialize().await.unwrap();
        log.append(&row("AAPL", "$2,500")).await.unwrap();
        let before = log.read_all().await.unwrap();

        let mut file = OpenOptions::new()
            .append(true)
            .open(log.path())
            .await
            .unwrap();
        let previous_len = file.metadata().await.unwrap().len();
        file.write_all(b"15:59:58,TSLA,Se").await.unwrap();
        file.flush().await.unwrap();

        let failed = Err(std::io::Error::other("disk full"));
        let result = log.settle(&mut file, previous_len, failed).await;
        assert!(matches!(result, Err(LogError::Io { .. })));
        drop(file);

        assert_eq!(log.read_all().await.unwrap(), before);

        log.append(&row("SPY", "$10")).await.unwrap();
        let symbols: Vec<String> = log
            .read_rows()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.symbol)
            .collect();
        assert_eq!(symbols, vec!["AAPL", "SPY"]);
    }

    #[tokio::test]
    async fn test_read_all_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let log = CsvLog::new(dir.path().join("absent.csv"));
        assert!(matches!(log.read_all().await, Err(LogError::Io { .. })));
    }

    #[tokio::test]
    async fn test_copy_to() {
        let dir = TempDir::new().unwrap();
        let log = CsvLog::new(dir.path().join("flow.csv"));
        log.initialize().await.unwrap();
        log.append(&row("IWM", "$5")).await.unwrap();

        let dest = dir.path().join("export.csv");
        let copied = log.copy_to(&dest).await.unwrap();
        assert_eq!(copied as usize, log.read_all().await.unwrap().len());
        assert_eq!(std::fs::read(&dest).unwrap(), log.read_all().await.unwrap());
    }
}
