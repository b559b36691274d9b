//! Configuration access port trait.

use std::path::PathBuf;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;

    /// Non-empty string value as a path.
    fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }
}
