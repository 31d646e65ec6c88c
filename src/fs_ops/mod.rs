//! Filesystem operations: primitives, atomic rename, cross-device copy fallback.

mod atomic;
mod copy;
mod helpers;
mod meta;
mod primitives;
mod transfer;
mod util;

pub use copy::safe_copy_and_rename;
pub use helpers::describe_io_error;
pub use primitives::{FileSystem, StdFileSystem};
pub use transfer::{Relocation, relocate};
pub use util::is_cross_device;
