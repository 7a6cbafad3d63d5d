use crate::Point3;
use std::fs::{self, File};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::Path;

/// Where the tools read and write points when no path is given.
pub const DEFAULT_POINTS_FILE: &str = "maps/points.bin";

/// Bytes per record: 3 × f32.
pub const RECORD_LEN: usize = 12;

#[inline(always)]
fn le_f32(b: &[u8]) -> f32 {
    f32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

#[cold]
fn bad(msg: String) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, msg)
}

/// Parse points from a contiguous byte slice.
pub fn parse_points(bytes: &[u8]) -> io::Result<Vec<Point3>> {
    if bytes.len() % RECORD_LEN != 0 {
        return Err(bad(format!(
            "points payload of {} bytes is not a multiple of {}",
            bytes.len(),
            RECORD_LEN
        )));
    }

    Ok(bytes
        .chunks_exact(RECORD_LEN)
        .map(|r| [le_f32(&r[0..4]), le_f32(&r[4..8]), le_f32(&r[8..12])])
        .collect())
}

pub fn read_points<P: AsRef<Path>>(path: P) -> io::Result<Vec<Point3>> {
    let bytes = fs::read(path)?;
    parse_points(&bytes)
}

/// Writes `points` to `path`, creating parent directories as needed.
/// Returns the number of points written.
pub fn write_points<P: AsRef<Path>>(path: P, points: &[Point3]) -> io::Result<usize> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for p in points {
        writer.write_all(&p[0].to_le_bytes())?;
        writer.write_all(&p[1].to_le_bytes())?;
        writer.write_all(&p[2].to_le_bytes())?;
    }
    writer.flush()?;

    Ok(points.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_preserves_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/points.bin");
        let points = vec![[42.0, 0.0, 1.0], [43.0, 1.0, 2.0], [44.0, 2.0, 3.0]];

        assert_eq!(write_points(&path, &points).unwrap(), 3);
        assert_eq!(fs::metadata(&path).unwrap().len(), 36);
        assert_eq!(read_points(&path).unwrap(), points);
    }

    #[test]
    fn empty_file_is_empty_cloud() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        write_points(&path, &[]).unwrap();
        assert!(read_points(&path).unwrap().is_empty());
    }

    #[test]
    fn truncated_record_is_invalid() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&2.0f32.to_le_bytes());
        bytes.extend_from_slice(&3.0f32.to_le_bytes());
        bytes.extend_from_slice(&[0, 0]);

        let err = parse_points(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn records_are_little_endian() {
        let mut bytes = Vec::new();
        for v in [1.5f32, -2.0, 0.25] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(parse_points(&bytes).unwrap(), vec![[1.5, -2.0, 0.25]]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_points(dir.path().join("nope.bin")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
