use crate::{atomic::write_atomic, dirs::ensure_database_dirs};
use cubegate_core::CubeFile;
use std::collections::HashSet;
use std::io;
use std::path::Path;

/// Write every cube file for a database to its model directory, and remove
/// any `.yml` file on disk that is no longer part of the set (a file
/// deleted from the registry disappears from disk too).
pub fn sync_cube_files_to_disk(
    base_dir: &Path,
    database_id: &str,
    files: &[CubeFile],
) -> io::Result<()> {
    let dir = ensure_database_dirs(base_dir, database_id)?;

    let mut kept = HashSet::new();
    for file in files {
        let path = dir.join(&file.file_name);
        write_atomic(&path, &file.content)?;
        kept.insert(file.file_name.clone());
    }

    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.ends_with(".yml") && !kept.contains(name) {
            std::fs::remove_file(entry.path())?;
        }
    }

    Ok(())
}
