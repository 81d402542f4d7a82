use std::io;
use std::path::{Path, PathBuf};

/// Layout: `{base_dir}/databases/{database_id}/model/cubes/*.yml`, mirroring
/// the directory shape the cube engine expects to find its schema files in.
pub fn database_model_dir(base_dir: &Path, database_id: &str) -> PathBuf {
    base_dir
        .join("databases")
        .join(database_id)
        .join("model")
        .join("cubes")
}

pub fn ensure_database_dirs(base_dir: &Path, database_id: &str) -> io::Result<PathBuf> {
    let dir = database_model_dir(base_dir, database_id);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_the_full_nested_path() {
        let base = tempdir().unwrap();
        let dir = ensure_database_dirs(base.path(), "db-1").unwrap();
        assert!(dir.is_dir());
        assert!(dir.ends_with("databases/db-1/model/cubes"));
    }
}
