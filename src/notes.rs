use std::fs;
use std::io;
use std::path::{Path, PathBuf};

// One note, one file, whole-file reads and overwrites.

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tally")
}

pub fn note_path() -> PathBuf {
    data_dir().join("secret_notes.txt")
}

pub fn history_path() -> PathBuf {
    data_dir().join("history.txt")
}

pub fn load(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

pub fn save(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_the_blob() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("secret_notes.txt");
        save(&path, "buy low\nsell high\n").unwrap();
        assert_eq!(load(&path), "buy low\nsell high\n");
        save(&path, "").unwrap();
        assert_eq!(load(&path), "");
    }

    #[test]
    fn missing_note_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load(&dir.path().join("absent.txt")), "");
    }
}
