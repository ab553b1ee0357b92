use std::path::PathBuf;

/// Panel geometry in pixels.
pub const PANEL_WIDTH: u32 = 64;
pub const PANEL_HEIGHT: u32 = 32;

/// Width of the left region reserved for the thumbnail.
pub const THUMBNAIL_REGION: u32 = 32;

/// Exit code the daemon uses to ask its supervisor for a restart
/// (`EX_TEMPFAIL` from sysexits.h).
pub const RESTART_EXIT_CODE: u8 = 75;

const APP_DIR: &str = "marquee";

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/marquee/ (XDG standard)
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    // On macOS and Linux, always use ~/.config/marquee/
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

/// Path of the tracing log written by the daemon.
pub fn daemon_log_path() -> PathBuf {
    data_dir().join("daemon.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_are_namespaced() {
        assert!(data_dir().ends_with(APP_DIR));
        assert!(config_dir().ends_with(APP_DIR));
        assert!(daemon_log_path().ends_with("marquee/daemon.log"));
    }
}
