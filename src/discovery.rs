//! Recursive enumeration of audio files under a dataset root.

use crate::AudioFormat;
use crate::error::DiscoveryError;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds every file under `root` whose extension is in the audio allow-list.
///
/// Paths are absolute. Enumeration order is unspecified. Non-audio files and
/// directories are skipped silently; only an unreadable or missing root is an
/// error, and in that case no partial list is returned.
pub fn find_audio_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>, DiscoveryError> {
    let root = root.as_ref();
    let root = fs::canonicalize(root).map_err(|e| DiscoveryError::from_io(root.to_path_buf(), e))?;
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root));
    }
    // canonicalize only needs search permission on the parents
    fs::read_dir(&root).map_err(|e| DiscoveryError::from_io(root.clone(), e))?;

    let mut audio_files = Vec::new();
    for entry in WalkDir::new(&root).into_iter().filter_map(|e| match e {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!("Skipping unreadable entry under {:?}: {}", root, e);
            None
        }
    }) {
        if !entry.file_type().is_file() {
            continue;
        }
        if AudioFormat::from_path(entry.path()).is_some() {
            audio_files.push(entry.into_path());
        }
    }
    debug!("Discovered {} audio files under {:?}", audio_files.len(), root);
    Ok(audio_files)
}

/// The label of a file: the name of its parent directory, or `""` if it has none.
pub fn label_for(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    #[test]
    fn finds_only_allow_listed_extensions() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "bird1/file1.ogg");
        touch(dir.path(), "bird1/file2.WAV");
        touch(dir.path(), "bird1/not_audio.txt");
        touch(dir.path(), "frog1/call.aif");
        touch(dir.path(), "frog1/call.aiff");
        touch(dir.path(), "frog1/notes");
        touch(dir.path(), "insect1/deep/nested/buzz.flac");
        touch(dir.path(), "insect1/cover.m4a");
        fs::create_dir_all(dir.path().join("empty_dir.mp3")).unwrap();

        let mut found: Vec<String> = find_audio_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| {
                assert!(p.is_absolute());
                p.strip_prefix(fs::canonicalize(dir.path()).unwrap())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        found.sort();

        assert_eq!(
            found,
            vec![
                "bird1/file1.ogg",
                "bird1/file2.WAV",
                "frog1/call.aif",
                "frog1/call.aiff",
                "insect1/deep/nested/buzz.flac",
            ]
        );
    }

    #[test]
    fn missing_root_is_path_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does_not_exist");
        match find_audio_files(&missing) {
            Err(DiscoveryError::PathNotFound(p)) => assert_eq!(p, missing),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn file_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "single.ogg");
        assert!(matches!(
            find_audio_files(dir.path().join("single.ogg")),
            Err(DiscoveryError::NotADirectory(_))
        ));
    }

    #[test]
    fn label_is_parent_directory_name() {
        assert_eq!(label_for("/data/train_audio/bird1/f1.ogg"), "bird1");
        assert_eq!(label_for("f1.ogg"), "");
    }
}
