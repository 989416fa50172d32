use std::ffi::OsString;
use std::fs;
use std::fs::File;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use log::debug;
use log::info;
use log::warn;

use super::CheckpointError;
use super::CheckpointState;

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// The path of the copy of the previous checkpoint kept while a new one is written.
pub fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".bak")
}

fn temporary_path(path: &Path) -> PathBuf {
    with_suffix(path, ".tmp")
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(error) if error.kind() != ErrorKind::NotFound => Err(error),
        _ => Ok(()),
    }
}

/// Replaces the checkpoint at `path` with `state`.
///
/// The new checkpoint is written to a temporary file first; the previous checkpoint is moved to
/// its backup path and only deleted once the new one is in place. If anything fails, the file at
/// `path` is the previous checkpoint.
pub fn write_checkpoint(path: &Path, state: &CheckpointState) -> Result<(), CheckpointError> {
    let temporary = temporary_path(path);
    if let Err(error) = write_file(&temporary, &state.encode()) {
        let _ = fs::remove_file(&temporary);
        return Err(error.into());
    }

    let backup = backup_path(path);
    let has_previous = path.exists();
    if has_previous {
        let moved = remove_if_present(&backup).and_then(|_| fs::rename(path, &backup));
        if let Err(error) = moved {
            let _ = fs::remove_file(&temporary);
            return Err(error.into());
        }
    }

    if let Err(error) = fs::rename(&temporary, path) {
        let _ = fs::remove_file(&temporary);
        if has_previous {
            let _ = fs::rename(&backup, path);
        }
        return Err(error.into());
    }

    if let Err(error) = remove_if_present(&backup) {
        warn!("Could not delete checkpoint backup {}: {error}", backup.display());
    }
    Ok(())
}

/// Reads the checkpoint at `path` for a search over `dimension` variables.
pub fn read_checkpoint(path: &Path, dimension: usize) -> Result<CheckpointState, CheckpointError> {
    let bytes = fs::read(path)?;
    CheckpointState::decode(&bytes, dimension)
}

fn try_restore(path: &Path, dimension: usize) -> Option<CheckpointState> {
    match read_checkpoint(path, dimension) {
        Ok(state) => {
            info!(
                "Restored checkpoint {} at iteration {}",
                path.display(),
                state.iter
            );
            Some(state)
        }
        Err(CheckpointError::Io(error)) if error.kind() == ErrorKind::NotFound => {
            debug!("No checkpoint at {}", path.display());
            None
        }
        Err(error) => {
            warn!("Discarding checkpoint {}: {error}", path.display());
            if let Err(error) = fs::remove_file(path) {
                warn!("Could not delete checkpoint {}: {error}", path.display());
            }
            None
        }
    }
}

/// Restores the checkpoint at `path`, falling back to its backup once.
///
/// A corrupt checkpoint file is deleted. Returns `None` when neither file holds a valid
/// checkpoint, in which case the search starts from scratch.
pub fn restore_checkpoint(path: &Path, dimension: usize) -> Option<CheckpointState> {
    if let Some(state) = try_restore(path, dimension) {
        return Some(state);
    }

    let is_backup = path
        .extension()
        .is_some_and(|extension| extension == "bak");
    if is_backup {
        None
    } else {
        try_restore(&backup_path(path), dimension)
    }
}

/// Deletes the checkpoint at `path` together with its backup.
pub fn remove_checkpoint(path: &Path) -> std::io::Result<()> {
    remove_if_present(path)?;
    remove_if_present(&backup_path(path))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::backup_path;
    use super::read_checkpoint;
    use super::remove_checkpoint;
    use super::restore_checkpoint;
    use super::temporary_path;
    use super::write_checkpoint;
    use crate::checkpoint::codec::tests::sample_state;

    fn checkpoint_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "sit-solver-{}-{name}.ckpt",
            std::process::id()
        ));
        let _ = remove_checkpoint(&path);
        let _ = fs::remove_file(temporary_path(&path));
        let _ = fs::remove_dir(temporary_path(&path));
        path
    }

    #[test]
    fn written_checkpoint_is_restored() {
        let path = checkpoint_path("round-trip");
        let state = sample_state();

        write_checkpoint(&path, &state).expect("checkpoint is written");

        assert_eq!(restore_checkpoint(&path, 2), Some(state));
        assert!(!backup_path(&path).exists());
        remove_checkpoint(&path).expect("checkpoint is removed");
        assert!(!path.exists());
    }

    #[test]
    fn rewriting_replaces_the_previous_checkpoint() {
        let path = checkpoint_path("rewrite");
        let mut state = sample_state();
        write_checkpoint(&path, &state).expect("checkpoint is written");

        state.iter += 100;
        write_checkpoint(&path, &state).expect("checkpoint is written");

        assert_eq!(read_checkpoint(&path, 2).expect("readable").iter, state.iter);
        assert!(!backup_path(&path).exists());
        remove_checkpoint(&path).expect("checkpoint is removed");
    }

    #[test]
    fn failed_write_leaves_previous_checkpoint_intact() {
        let path = checkpoint_path("atomic");
        let state = sample_state();
        write_checkpoint(&path, &state).expect("checkpoint is written");

        // A directory in place of the temporary file makes the next write fail.
        fs::create_dir(temporary_path(&path)).expect("directory is created");
        let mut newer = state.clone();
        newer.iter += 1;
        assert!(write_checkpoint(&path, &newer).is_err());

        assert_eq!(read_checkpoint(&path, 2).expect("readable"), state);

        fs::remove_dir(temporary_path(&path)).expect("directory is removed");
        remove_checkpoint(&path).expect("checkpoint is removed");
    }

    #[test]
    fn corrupt_checkpoint_falls_back_to_backup() {
        let path = checkpoint_path("fallback");
        let state = sample_state();
        write_checkpoint(&path, &state).expect("checkpoint is written");
        let _ = fs::copy(&path, backup_path(&path)).expect("backup is created");

        let bytes = fs::read(&path).expect("readable");
        fs::write(&path, &bytes[..bytes.len() / 2]).expect("checkpoint is truncated");

        assert_eq!(restore_checkpoint(&path, 2), Some(state));
        assert!(!path.exists());
        remove_checkpoint(&path).expect("checkpoint is removed");
    }

    #[test]
    fn corrupt_checkpoint_without_backup_starts_fresh() {
        let path = checkpoint_path("fresh");
        fs::write(&path, [1, 2, 3]).expect("garbage is written");

        assert_eq!(restore_checkpoint(&path, 2), None);
        assert!(!path.exists());
    }

    #[test]
    fn missing_checkpoint_restores_nothing() {
        let path = checkpoint_path("missing");
        assert_eq!(restore_checkpoint(&path, 2), None);
    }
}
