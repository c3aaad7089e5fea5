pub mod walk;

pub use walk::{has_real_subdirs, list_real_files, walk_folders, walk_real_files};
