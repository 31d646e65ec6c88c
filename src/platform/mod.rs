//! Platform-specific helpers.
//! This module hides OS differences (Unix/Windows) behind a uniform API so
//! the stores, config and logging code can remain platform-agnostic.

mod temp;
#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

pub use temp::tmp_sibling_name;

#[cfg(unix)]
pub use unix::{
    atomic_write_private, open_log_file_secure_append, set_dir_mode_0700, set_file_mode_0600,
    write_new_file_private,
};

#[cfg(not(unix))]
pub use windows::{
    atomic_write_private, open_log_file_secure_append, set_dir_mode_0700, set_file_mode_0600,
    write_new_file_private,
};
