use std::io;
use std::path::Path;

/// Write `contents` to `path` atomically: write to a sibling randomly
/// named `.tmp` file, then rename over the destination. A reader of `path`
/// never observes a partially written file, even if the process is killed
/// mid-write, and two concurrent writers never clobber the same temp file.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let token = uuid::Uuid::new_v4().simple().to_string();
    let tmp_path = path.with_extension(format!("{token}.tmp"));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)
}
