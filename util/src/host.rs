//! Host platform utility functions

use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "LF_SW_ROOT";

/// Get the root directory of the software, as given by the `LF_SW_ROOT` environment variable.
///
/// Parameter files are resolved relative to `$LF_SW_ROOT/params`, and session directories are
/// created under this root.
pub fn get_lf_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
