use super::Config;

pub const BIND_ADDR: &str = "127.0.0.1:3000";
pub const TIMEOUT_SECS: u64 = 10;

pub const SOUNDCLOUD_API: &str = "https://api-v2.soundcloud.com";
pub const SOUNDCLOUD_WEB: &str = "https://soundcloud.com";
pub const SEARCH_LIMIT: u32 = 20;
pub const HISTORY_LIMIT: u32 = 50;

pub const LRCLIB_API: &str = "https://lrclib.net/api";
pub const NETEASE_API: &str = "https://music.163.com";
pub const QQ_SEARCH_API: &str = "https://c.y.qq.com";
pub const MUSIXMATCH_API: &str = "https://api.musixmatch.com/ws/1.1";
pub const MUSIXMATCH_DESKTOP_API: &str = "https://apic-desktop.musixmatch.com/ws/1.1";
pub const MUSIXMATCH_WEB: &str = "https://www.musixmatch.com";

/// Config written to disk on first run.
pub fn defaults() -> Config {
    Config::default()
}
