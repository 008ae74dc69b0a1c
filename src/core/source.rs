use crate::domain::model::InputRecord;
use crate::domain::ports::RecordSource;
use crate::utils::error::{EtlError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const INPUT_DELIMITER: u8 = b';';

/// 以 `;` 分隔的 Before-EOD CSV 讀取器，第一列一律視為表頭丟棄
pub struct CsvRecordSource<R: Read> {
    reader: csv::Reader<R>,
    buffer: csv::StringRecord,
    header_pending: bool,
}

impl CsvRecordSource<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("=> open csv file {}", path.display());

        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EtlError::InputNotFound {
                path: path.to_path_buf(),
            },
            _ => EtlError::IoError(e),
        })?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> CsvRecordSource<R> {
    pub fn from_reader(rdr: R) -> Self {
        // 表頭自行處理：空檔案才會得到零筆而不是錯誤
        let reader = csv::ReaderBuilder::new()
            .delimiter(INPUT_DELIMITER)
            .has_headers(false)
            .from_reader(rdr);

        Self {
            reader,
            buffer: csv::StringRecord::new(),
            header_pending: true,
        }
    }
}

impl<R: Read + Send> RecordSource for CsvRecordSource<R> {
    fn next_record(&mut self) -> Result<Option<InputRecord>> {
        loop {
            if !self.reader.read_record(&mut self.buffer)? {
                return Ok(None);
            }

            if self.header_pending {
                self.header_pending = false;
                continue;
            }

            return Ok(Some(parse_record(&self.buffer)));
        }
    }
}

impl<R: Read + Send> Iterator for CsvRecordSource<R> {
    type Item = Result<InputRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

fn parse_record(row: &csv::StringRecord) -> InputRecord {
    InputRecord {
        id: lenient_int(row.get(0)),
        name: row.get(1).unwrap_or_default().to_string(),
        age: lenient_int(row.get(2)),
        balance: lenient_int(row.get(3)),
        previous_balance: lenient_int(row.get(4)),
        average_balance: lenient_int(row.get(5)),
        free_transfer: lenient_int(row.get(6)),
    }
}

/// 無法解析的數字一律當作 0，不回報錯誤
pub fn lenient_int(field: Option<&str>) -> i64 {
    field.and_then(|s| s.parse::<i64>().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "id;Nama;Age;Balanced;Previous Balanced;Average Balanced;Free Transfer\n";

    fn source(body: &str) -> CsvRecordSource<std::io::Cursor<Vec<u8>>> {
        CsvRecordSource::from_reader(std::io::Cursor::new(body.as_bytes().to_vec()))
    }

    #[test]
    fn test_header_is_skipped() {
        let mut src = source(&format!("{}1;Alice;30;200;180;0;5\n", HEADER));

        let record = src.next_record().unwrap().unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.name, "Alice");
        assert_eq!(record.age, 30);
        assert_eq!(record.balance, 200);
        assert_eq!(record.previous_balance, 180);
        assert_eq!(record.free_transfer, 5);

        assert!(src.next_record().unwrap().is_none());
    }

    #[test]
    fn test_first_row_dropped_even_if_numeric() {
        let mut src = source("1;Alice;30;200;180;0;5\n2;Bob;40;100;100;0;2\n");
        let ids: Vec<i64> = src.by_ref().map(|r| r.unwrap().id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_malformed_numbers_become_zero() {
        let mut src = source(&format!("{}abc;Carol;x;;1.5;zz;-\n", HEADER));

        let record = src.next_record().unwrap().unwrap();
        assert_eq!(record.id, 0);
        assert_eq!(record.name, "Carol");
        assert_eq!(record.age, 0);
        assert_eq!(record.balance, 0);
        assert_eq!(record.previous_balance, 0);
        assert_eq!(record.average_balance, 0);
        assert_eq!(record.free_transfer, 0);
    }

    #[test]
    fn test_negative_numbers_parse() {
        let mut src = source(&format!("{}-7;Dan;20;-300;-1;0;-2\n", HEADER));
        let record = src.next_record().unwrap().unwrap();
        assert_eq!(record.id, -7);
        assert_eq!(record.balance, -300);
        assert_eq!(record.free_transfer, -2);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let mut src = source("");
        assert!(src.next_record().unwrap().is_none());

        let mut header_only = source(HEADER);
        assert!(header_only.next_record().unwrap().is_none());
    }

    #[test]
    fn test_inconsistent_field_count_is_an_error() {
        let mut src = source(&format!("{}1;Alice;30\n", HEADER));
        let err = src.next_record().unwrap_err();
        assert!(matches!(err, EtlError::CsvError(_)));
    }

    #[test]
    fn test_missing_file_is_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("Before Eod.csv");

        match CsvRecordSource::from_path(&missing) {
            Err(EtlError::InputNotFound { path }) => assert_eq!(path, missing),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected missing file error"),
        }
    }

    #[test]
    fn test_from_path_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}1;Alice;30;200;180;0;5\n150;Bob;40;100;100;0;2\n", HEADER).unwrap();

        let src = CsvRecordSource::from_path(file.path()).unwrap();
        let records: Vec<InputRecord> = src.map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "Bob");
    }
}
