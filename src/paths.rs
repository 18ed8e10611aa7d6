use std::path::PathBuf;

pub fn log_dir_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
    base.join("aniroll").join("logs")
}
