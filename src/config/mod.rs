//! Configuration: types, default paths, XML loading and validation.
//!
//! Precedence (highest first): CLI flags, XML file, built-in defaults.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{
    CONFIG_ENV_VAR, default_config_path, default_data_dir, default_log_path,
    path_has_symlink_ancestor,
};
pub use types::{AreaEntry, CategoryEntry, Config, DriveConfig, FolderEntry, LogLevel};
pub use xml::{
    LoadResult, create_template_config, load_config_from_xml_path, load_or_init, parse_config_xml,
};
