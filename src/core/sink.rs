use crate::domain::model::OutputRow;
use crate::domain::ports::ResultSink;
use crate::utils::error::{EtlError, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// 以 `,` 分隔的 After-EOD 輸出。csv::Writer 本身不可並行使用，所有寫入都經過同一把鎖
pub struct CsvResultSink<W: Write + Send> {
    writer: Mutex<Option<csv::Writer<W>>>,
    rows_written: AtomicU64,
}

impl CsvResultSink<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("=> write csv file {}", path.display());

        let file = File::create(path).map_err(|source| EtlError::OutputUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write + Send> CsvResultSink<W> {
    pub fn from_writer(wtr: W) -> Self {
        Self {
            writer: Mutex::new(Some(csv::WriterBuilder::new().from_writer(wtr))),
            rows_written: AtomicU64::new(0),
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written.load(Ordering::Acquire)
    }

    /// 關閉並取回底層 writer（測試用來檢查輸出內容）
    pub fn into_inner(self) -> Result<Option<W>> {
        match self.writer.into_inner() {
            Some(writer) => writer
                .into_inner()
                .map(Some)
                .map_err(|e| EtlError::IoError(e.into_error())),
            None => Ok(None),
        }
    }
}

impl<W: Write + Send> ResultSink for CsvResultSink<W> {
    async fn write_header(&self, header: &[&str]) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(EtlError::SinkClosed)?;
        writer.write_record(header)?;
        Ok(())
    }

    async fn write_row(&self, row: &OutputRow) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(EtlError::SinkClosed)?;
        writer.write_record(row.fields())?;
        self.rows_written.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(EtlError::SinkClosed)?;
        writer.flush()?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.writer.lock().await;
        if let Some(mut writer) = guard.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{InputRecord, Transformed, OUTPUT_HEADER};
    use std::sync::Arc;

    fn row(id: i64, worker: usize) -> OutputRow {
        let record = InputRecord {
            id,
            name: format!("Name {}", id),
            age: 20,
            balance: 100,
            previous_balance: 50,
            average_balance: 0,
            free_transfer: 1,
        };
        let derived = Transformed {
            average_balance: 75,
            free_transfer_quota: 6,
            adjusted_balance: 110,
        };
        OutputRow::build(&record, &derived, worker)
    }

    #[tokio::test]
    async fn test_header_and_rows_are_comma_delimited() {
        let sink = CsvResultSink::from_writer(Vec::new());
        sink.write_header(&OUTPUT_HEADER).await.unwrap();
        sink.write_row(&row(1, 0)).await.unwrap();
        sink.flush().await.unwrap();
        assert_eq!(sink.rows_written(), 1);

        let bytes = sink.into_inner().unwrap().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "id,Nama,Age,Balanced,No 2b Thread-No,No 3 Thread-No,Previous Balanced,Average Balanced,No 1 Thread-No,Free Transfer,No 2a Thread-No"
        );
        assert_eq!(lines[1], "1,Name 1,20,110,0,0,50,75,0,6,0");
    }

    #[tokio::test]
    async fn test_write_after_close_is_sink_closed() {
        let sink = CsvResultSink::from_writer(Vec::new());
        sink.close().await.unwrap();

        let err = sink.write_row(&row(1, 0)).await.unwrap_err();
        assert!(matches!(err, EtlError::SinkClosed));
        assert!(!err.is_retryable());
        assert!(sink.into_inner().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_writers_do_not_interleave() {
        let sink = Arc::new(CsvResultSink::from_writer(Vec::new()));

        let mut handles = Vec::new();
        for worker in 0..4usize {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50i64 {
                    sink.write_row(&row(worker as i64 * 1000 + i, worker))
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let sink = Arc::try_unwrap(sink).ok().unwrap();
        assert_eq!(sink.rows_written(), 200);

        let bytes = sink.into_inner().unwrap().unwrap();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes.as_slice());
        let mut count = 0;
        for record in reader.records() {
            let record = record.unwrap();
            assert_eq!(record.len(), 11);
            count += 1;
        }
        assert_eq!(count, 200);
    }
}
