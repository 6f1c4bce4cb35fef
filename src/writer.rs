use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::parser::extract::Record;

pub const HEADER: [&str; 3] = ["title", "price", "availability"];
const DELIMITER: char = ',';
const TERMINATOR: &str = "\r\n";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to move finished file into place at {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Write `records` as CSV to `path`.
///
/// Rows go to a temporary file next to `path`, which is synced and then
/// renamed over the target. On any error the temporary file is removed and
/// an existing target is left as it was.
pub fn write_records(records: &[Record], path: &Path) -> Result<(), WriteError> {
    let io_failed = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = create_temp(dir, path).map_err(io_failed)?;
    debug!(tmp = %tmp.path().display(), "Writing {} rows", records.len());

    write_csv(tmp.as_file_mut(), records).map_err(io_failed)?;
    tmp.as_file().sync_all().map_err(io_failed)?;

    tmp.persist(path).map_err(|e| WriteError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Temp file in `dir` created with the mode a plain `File::create` would
/// get (umask applies). A file being replaced keeps its own permissions.
fn create_temp(dir: &Path, target: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let tmp = builder.tempfile_in(dir)?;

    if let Ok(meta) = std::fs::metadata(target) {
        if meta.is_file() {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
    }
    Ok(tmp)
}

fn write_csv(file: &mut File, records: &[Record]) -> io::Result<()> {
    let mut out = BufWriter::new(file);
    write_row(&mut out, &HEADER)?;
    for r in records {
        write_row(&mut out, &[r.title.as_str(), r.price.as_str(), r.availability.as_str()])?;
    }
    out.flush()
}

fn needs_quotes(field: &str) -> bool {
    field.contains(DELIMITER) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CRLF-terminated row. Fields holding the delimiter, a
/// quote or a line break are quoted, with inner quotes doubled.
pub fn write_row<W: Write>(mut w: W, row: &[&str]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, "{}", DELIMITER)?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    w.write_all(TERMINATOR.as_bytes())
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::csv_read::parse_rows;
    use super::*;

    fn record(title: &str, price: &str, availability: &str) -> Record {
        Record {
            title: title.into(),
            price: price.into(),
            availability: availability.into(),
        }
    }

    fn row_string(row: &[&str]) -> String {
        let mut buf = Vec::new();
        write_row(&mut buf, row).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn plain_fields_are_bare() {
        assert_eq!(
            row_string(&["A Light in the Attic", "£51.77", "In stock"]),
            "A Light in the Attic,£51.77,In stock\r\n"
        );
    }

    #[test]
    fn special_characters_are_quoted() {
        assert_eq!(row_string(&["a,b"]), "\"a,b\"\r\n");
        assert_eq!(row_string(&["say \"hi\""]), "\"say \"\"hi\"\"\"\r\n");
        assert_eq!(row_string(&["two\nlines"]), "\"two\nlines\"\r\n");
        assert_eq!(row_string(&["cr\rhere"]), "\"cr\rhere\"\r\n");
        assert_eq!(row_string(&["", "x"]), ",x\r\n");
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.csv");
        let records = vec![
            record("A Light in the Attic", "£51.77", "In stock"),
            record("Tipping the Velvet", "£53.74", "In stock"),
        ];
        write_records(&records, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "title,price,availability\r\n\
             A Light in the Attic,£51.77,In stock\r\n\
             Tipping the Velvet,£53.74,In stock\r\n"
        );
    }

    #[test]
    fn empty_input_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.csv");
        write_records(&[], &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "title,price,availability\r\n"
        );
    }

    #[test]
    fn round_trip_recovers_awkward_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.csv");
        let records = vec![
            record("Comma, Inc.", "£1.00", "In stock"),
            record("The \"Quoted\" One", "£2.00", "Out of stock"),
            record("Line\nbreak", "€3,50", "In stock (1 available)"),
            record("Café Œuvre — 東京", "£4.00", "In stock"),
        ];
        write_records(&records, &path).unwrap();

        let rows = parse_rows(&std::fs::read_to_string(&path).unwrap());
        assert_eq!(rows[0], HEADER.map(String::from).to_vec());
        let back: Vec<Record> = rows[1..]
            .iter()
            .map(|r| record(&r[0], &r[1], &r[2]))
            .collect();
        assert_eq!(back, records);
    }

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.csv");
        std::fs::write(&path, "stale contents that are longer than the new file\n".repeat(10)).unwrap();

        write_records(&[record("T", "£1.00", "In stock")], &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "title,price,availability\r\nT,£1.00,In stock\r\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn replacing_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.csv");
        std::fs::write(&path, "old\r\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        write_records(&[record("T", "£1.00", "In stock")], &path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn missing_directory_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("books.csv");
        let err = write_records(&[], &path).unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn failed_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the target's place makes the final rename fail.
        let path = dir.path().join("books.csv");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep.txt"), "x").unwrap();

        let err = write_records(&[record("T", "£1.00", "In stock")], &path).unwrap_err();
        assert!(matches!(err, WriteError::Persist { .. }));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("books.csv")]);
        assert!(path.is_dir());
    }
}
