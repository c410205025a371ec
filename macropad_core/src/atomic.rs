//! Crash-safe file replacement for persisted calibration.

use std::{ffi::OsString, fs, io::Write, path::Path};

/// Write `bytes` to `path` via a sibling temp file and a rename, so readers
/// see either the old or the new contents.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path
        .file_name()
        .map_or_else(|| OsString::from("macropad"), OsString::from);
    tmp_name.push(".new");
    let tmp = path.with_file_name(tmp_name);
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_contents_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.toml");
        write_atomic(&path, b"old").unwrap();
        write_atomic(&path, b"[calibration]\nraw_min = 1\n").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[calibration]\nraw_min = 1\n"
        );
        assert!(!dir.path().join("calibration.toml.new").exists());
    }
}
