//! Module for searching for hotas-to-gamepad config files

use std::path::PathBuf;

/// Name of the config file in the current directory
const LOCAL_CONFIG_FILE: &str = "./hotas-to-gamepad.yaml";

/// System wide config file
const SYSTEM_CONFIG_FILE: &str = "/etc/hotas-to-gamepad/config.yaml";

/// Example config shipped with the source tree
const ROOTFS_CONFIG_FILE: &str = "./rootfs/usr/share/hotas-to-gamepad/config.yaml";

/// Returns the path of the user config file (e.g.
/// "~/.config/hotas-to-gamepad/config.yaml")
pub fn get_user_config_path() -> Option<PathBuf> {
    let Ok(base_dirs) = xdg::BaseDirectories::with_prefix("hotas-to-gamepad") else {
        log::warn!("Unable to determine user config path.");
        return None;
    };
    Some(base_dirs.get_config_file("config.yaml"))
}

/// Returns the list of config file paths in search order.
/// E.g. ["./hotas-to-gamepad.yaml", "~/.config/hotas-to-gamepad/config.yaml", ...]
pub fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(path) = get_user_config_path() {
        paths.push(path);
    }
    paths.push(PathBuf::from(SYSTEM_CONFIG_FILE));
    paths.push(PathBuf::from(ROOTFS_CONFIG_FILE));

    paths
}

/// Returns the first config file that exists in the search paths
pub fn find_config() -> Option<PathBuf> {
    get_config_paths().into_iter().find(|path| {
        log::trace!("Checking for config at {path:?}");
        path.is_file()
    })
}
