//! CSV reading and writing for the two interchange tables.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::records::{ComponentRecord, ComponentRow, NetRecord, NetRow, COMPONENT_HEADER, NET_HEADER};
use super::InterchangeError;

/// Where a table ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub path: PathBuf,
    /// True when the requested path was not writable
    pub fallback: bool,
    pub rows: usize,
}

/// Sibling path with `_tmp` inserted before the extension:
/// `out/parts.csv` becomes `out/parts_tmp.csv`.
pub fn fallback_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_tmp.{}", stem, ext.to_string_lossy()),
        None => format!("{}_tmp", stem),
    };
    path.with_file_name(name)
}

fn create_with_fallback(path: &Path) -> Result<(File, PathBuf, bool), InterchangeError> {
    match File::create(path) {
        Ok(file) => Ok((file, path.to_path_buf(), false)),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            let alternate = fallback_path(path);
            warn!("{} is not writable, using {}", path.display(), alternate.display());
            let file = File::create(&alternate).map_err(|source| InterchangeError::Io {
                path: alternate.clone(),
                source,
            })?;
            Ok((file, alternate, true))
        }
        Err(source) => Err(InterchangeError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Header first, even for an empty table
pub fn write_rows<W: Write, T: Serialize>(writer: W, header: &[&str], rows: &[T]) -> Result<(), InterchangeError> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(header)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().map_err(|source| InterchangeError::Io {
        path: PathBuf::new(),
        source,
    })?;
    Ok(())
}

/// One result per data row; a malformed row does not hide the others.
pub fn read_rows<R: Read, T: DeserializeOwned>(reader: R) -> Result<Vec<Result<T, InterchangeError>>, InterchangeError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    csv_reader.headers()?;
    Ok(csv_reader
        .deserialize::<T>()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| InterchangeError::Record {
                row: i + 1,
                message: e.to_string(),
            })
        })
        .collect())
}

fn open(path: &Path) -> Result<File, InterchangeError> {
    File::open(path).map_err(|source| InterchangeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_components(path: &Path, records: &[ComponentRecord]) -> Result<Written, InterchangeError> {
    let rows = records.iter().map(ComponentRecord::to_row).collect::<Result<Vec<_>, _>>()?;
    let (file, used, fallback) = create_with_fallback(path)?;
    write_rows(file, &COMPONENT_HEADER, &rows)?;
    debug!("Wrote {} component rows to {}", rows.len(), used.display());
    Ok(Written {
        path: used,
        fallback,
        rows: rows.len(),
    })
}

pub fn write_nets(path: &Path, records: &[NetRecord]) -> Result<Written, InterchangeError> {
    let rows = records.iter().map(NetRecord::to_row).collect::<Result<Vec<_>, _>>()?;
    let (file, used, fallback) = create_with_fallback(path)?;
    write_rows(file, &NET_HEADER, &rows)?;
    debug!("Wrote {} net rows to {}", rows.len(), used.display());
    Ok(Written {
        path: used,
        fallback,
        rows: rows.len(),
    })
}

pub fn read_components(path: &Path) -> Result<Vec<Result<ComponentRecord, InterchangeError>>, InterchangeError> {
    let rows = read_rows::<_, ComponentRow>(open(path)?)?;
    Ok(rows
        .into_iter()
        .map(|row| row.and_then(|r| ComponentRecord::from_row(&r)))
        .collect())
}

pub fn read_nets(path: &Path) -> Result<Vec<Result<NetRecord, InterchangeError>>, InterchangeError> {
    let rows = read_rows::<_, NetRow>(open(path)?)?;
    Ok(rows
        .into_iter()
        .map(|row| row.and_then(|r| NetRecord::from_row(&r)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Span};
    use crate::interchange::{AttributeRecord, LabelRecord};

    #[test]
    fn test_fallback_path_inserts_suffix_before_extension() {
        assert_eq!(fallback_path(Path::new("out/parts.csv")), PathBuf::from("out/parts_tmp.csv"));
        assert_eq!(fallback_path(Path::new("net")), PathBuf::from("net_tmp"));
    }

    #[test]
    fn test_empty_table_still_has_header() {
        let mut buf = Vec::new();
        write_rows::<_, NetRow>(&mut buf, &NET_HEADER, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Segments,Labels,Attributes\n");
    }

    #[test]
    fn test_embedded_json_survives_quoting() {
        let record = NetRecord {
            segments: vec![Span::new(Point::new(0, 0), Point::new(0, 40))],
            labels: vec![LabelRecord {
                name: "A,B \"quoted\"".to_string(),
                x: 0,
                y: 20,
                seg_x1: 0,
                seg_y1: 0,
                seg_x2: 0,
                seg_y2: 40,
                orientation: Some(0),
                size: Some(10),
            }],
            attributes: vec![AttributeRecord {
                name: "CLASS".to_string(),
                value: Some("power".to_string()),
                ..Default::default()
            }],
        };
        let mut buf = Vec::new();
        write_rows(&mut buf, &NET_HEADER, &[record.to_row().unwrap()]).unwrap();

        let rows = read_rows::<_, NetRow>(buf.as_slice()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = rows.into_iter().next().unwrap().unwrap();
        assert_eq!(NetRecord::from_row(&row).unwrap(), record);
    }

    #[test]
    fn test_missing_columns_read_as_empty() {
        let data = "Refdes,Partition,Symbol,X,Y\nR1,Discrete,RES.1,10,20\n";
        let rows = read_rows::<_, ComponentRow>(data.as_bytes()).unwrap();
        let record = ComponentRecord::from_row(rows[0].as_ref().unwrap()).unwrap();
        assert_eq!(record.location, Point::new(10, 20));
        assert_eq!(record.orientation, None);
    }

    #[test]
    fn test_files_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parts.csv");
        let record = ComponentRecord {
            refdes: "C1".to_string(),
            partition: "Discrete".to_string(),
            symbol: "CAP.1".to_string(),
            location: Point::new(300, -40),
            orientation: Some(1),
            scale: Some(1.5),
            attributes: Vec::new(),
        };
        let written = write_components(&path, std::slice::from_ref(&record)).unwrap();
        assert_eq!(written.path, path);
        assert!(!written.fallback);
        let read = read_components(&path).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].as_ref().unwrap(), &record);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_target_writes_tmp_sibling() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parts.csv");
        std::fs::write(&path, "locked").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o444)).unwrap();
        if std::fs::OpenOptions::new().write(true).open(&path).is_ok() {
            // permission bits do not bind this user
            return;
        }

        let record = ComponentRecord {
            refdes: "R2".to_string(),
            partition: "Discrete".to_string(),
            symbol: "RES.1".to_string(),
            location: Point::new(-120, 60),
            orientation: Some(3),
            scale: None,
            attributes: Vec::new(),
        };
        let written = write_components(&path, std::slice::from_ref(&record)).unwrap();
        assert!(written.fallback);
        assert!(written.path.ends_with("parts_tmp.csv"));
        assert_eq!(written.rows, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "locked");

        let read = read_components(&written.path).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].as_ref().unwrap(), &record);
    }
}
