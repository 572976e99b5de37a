//! セッション一括ダウンロード用の zip
//!
//! エントリ名は display_name。セッション内で一意なので重複しない。

use std::io::{Cursor, Write};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::StorageError;

/// 組み立て済みの zip
#[derive(Debug, Clone)]
pub struct SessionArchive {
    /// `processed_files_<YYYYmmdd_HHMMSS>.zip`
    pub file_name: String,
    pub entries: usize,
    pub bytes: Bytes,
}

pub(crate) fn archive_file_name(at: DateTime<Utc>) -> String {
    format!("processed_files_{}.zip", at.format("%Y%m%d_%H%M%S"))
}

/// `(display_name, bytes)` の列を deflate 圧縮の zip にまとめる
pub(crate) fn build_zip<'a, I>(entries: I) -> Result<(usize, Bytes), StorageError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut count = 0;
    for (name, data) in entries {
        zip.start_file(name, options)?;
        zip.write_all(data).map_err(zip::result::ZipError::from)?;
        count += 1;
    }
    let cursor = zip.finish()?;
    Ok((count, Bytes::from(cursor.into_inner())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn file_name_carries_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(archive_file_name(at), "processed_files_20240309_070501.zip");
    }

    #[test]
    fn entries_keep_names_and_order() {
        let (count, bytes) = build_zip([
            ("Quarterly Report.pdf", b"%PDF-a".as_slice()),
            ("請求書.pdf", b"%PDF-b".as_slice()),
        ])
        .unwrap();
        assert_eq!(count, 2);

        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.by_index(0).unwrap().name(), "Quarterly Report.pdf");

        let mut content = Vec::new();
        archive
            .by_name("請求書.pdf")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"%PDF-b");
    }
}
