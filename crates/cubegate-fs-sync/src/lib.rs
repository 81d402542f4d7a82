//! CubeGate FS Sync
//!
//! Materializes the registry onto disk for the cube engine to read:
//! `cube-connections.json` and each database's cube YAML tree, written with
//! atomic tmp-then-rename semantics so the cube engine never observes a
//! half-written file.

mod atomic;
mod connections;
mod cube_files;
mod dirs;
mod sync_all;

pub use atomic::write_atomic;
pub use connections::{rewrite_host_for_docker_bridge, sync_connections_to_disk};
pub use cube_files::sync_cube_files_to_disk;
pub use dirs::{database_model_dir, ensure_database_dirs};
pub use sync_all::sync_all_to_disk;
