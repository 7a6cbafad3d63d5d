//! Reloads a points file whenever it changes on disk.

use crate::stream::PointSlot;
use notify::{
    event::{AccessKind, AccessMode, ModifyKind},
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};

/// Starts watching `path`. Each write to it publishes the file's points as a
/// replacement cloud, exactly like a stream message. Dropping the returned
/// watcher stops it.
pub fn watch_points_file(path: PathBuf, points: PointSlot) -> notify::Result<RecommendedWatcher> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let target = path.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if touches(&event, &target) => {
            reload(&target, &points);
        }
        Ok(_) => {}
        Err(e) => log::warn!("Watch error on {}: {}", target.display(), e),
    })?;

    // Watch the directory so files replaced by rename are still seen.
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    log::info!("Watching {} for changes", path.display());

    Ok(watcher)
}

/// Whether `event` may have left new contents in `target`.
fn touches(event: &Event, target: &Path) -> bool {
    let written = matches!(
        event.kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_) | ModifyKind::Any)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    );

    written && event.paths.iter().any(|p| p.file_name() == target.file_name())
}

/// Reads `path` and publishes its points. Returns whether anything was published.
pub fn reload(path: &Path, points: &PointSlot) -> bool {
    match pointfile::read_points(path) {
        Ok(read) => {
            log::info!("Reloaded {} points from {}", read.len(), path.display());
            points.publish(pointfile::flatten(&read))
        }
        Err(e) => {
            // A writer may still be mid-file; its close event triggers another read.
            log::debug!("Skipping reload of {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::PointCloud, stream};
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use std::{
        fs,
        time::{Duration, Instant},
    };

    #[test]
    fn reload_publishes_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.bin");
        pointfile::write_points(&path, &[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();

        let (tx, mut inbox) = stream::channel();
        let mut cloud = PointCloud::new();

        assert!(reload(&path, &tx.point_slot()));
        assert!(inbox.drain_into(&mut cloud));
        assert_eq!(cloud.vertices(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn half_written_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.bin");
        fs::write(&path, [0u8; 13]).unwrap();

        let (tx, mut inbox) = stream::channel();
        let mut cloud = PointCloud::from_points(&[[9.0, 9.0, 9.0]]);

        assert!(!reload(&path, &tx.point_slot()));
        assert!(!inbox.drain_into(&mut cloud));
        assert_eq!(cloud.vertices(), &[9.0, 9.0, 9.0]);
    }

    #[test]
    fn only_writes_to_the_target_count() {
        let target = Path::new("/data/maps/points.bin");
        let other = Path::new("/data/maps/other.bin");

        let write = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(target.to_path_buf());
        let closed = Event::new(EventKind::Access(AccessKind::Close(AccessMode::Write)))
            .add_path(target.to_path_buf());
        let created = Event::new(EventKind::Create(CreateKind::File)).add_path(target.to_path_buf());
        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path(target.to_path_buf());
        let elsewhere = Event::new(EventKind::Create(CreateKind::File)).add_path(other.to_path_buf());

        assert!(touches(&write, target));
        assert!(touches(&closed, target));
        assert!(touches(&created, target));
        assert!(!touches(&removed, target));
        assert!(!touches(&elsewhere, target));
    }

    #[test]
    fn rewriting_a_watched_file_replaces_the_cloud() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.bin");
        pointfile::write_points(&path, &[[0.0, 0.0, 0.0]]).unwrap();

        let (tx, mut inbox) = stream::channel();
        let _watcher = watch_points_file(path.clone(), tx.point_slot()).unwrap();

        pointfile::write_points(&path, &[[7.0, 8.0, 9.0], [1.0, 1.0, 1.0]]).unwrap();

        let mut cloud = PointCloud::new();
        let deadline = Instant::now() + Duration::from_secs(10);
        while cloud.point_count() != 2 && Instant::now() < deadline {
            inbox.drain_into(&mut cloud);
            std::thread::sleep(Duration::from_millis(20));
        }

        assert_eq!(cloud.vertices(), &[7.0, 8.0, 9.0, 1.0, 1.0, 1.0]);
    }
}
