//! Project bookkeeping: the `.boilersync` manifest and nested project registration

pub mod manifest;
pub mod registry;

pub use manifest::{manifest_path, register_child, Manifest, MANIFEST_FILE_NAME};
pub use registry::{
    find_ancestor_manifest, find_project_root, locate_project_root, register_with_parent,
};
