//! Finding the images to annotate under the user's input path.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;

/// Prefix macOS uses for AppleDouble sidecars (`._IMG_0001.jpg`) on
/// non-HFS volumes. They carry an image extension but hold resource-fork data.
const APPLE_DOUBLE_PREFIX: &str = "._";

/// Selects image files by extension from a file or folder input.
#[derive(Debug, Clone)]
pub struct ImageDiscovery {
    formats: Vec<String>,
}

impl ImageDiscovery {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            formats: config
                .supported_formats
                .iter()
                .map(|f| f.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Images to annotate, sorted by path.
    ///
    /// A single file is returned when it is a supported image. A folder is
    /// walked recursively. An empty result is not an error; the batch reports
    /// it and finishes with zero counts.
    pub fn discover(&self, input: &Path) -> Vec<PathBuf> {
        if input.is_file() {
            if self.is_image(input) {
                return vec![input.to_path_buf()];
            }
            tracing::warn!("Not a supported image: {:?}", input);
            return Vec::new();
        }

        let mut images: Vec<PathBuf> = WalkDir::new(input)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!("Skipping unreadable entry: {err}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && self.is_image(entry.path()))
            .map(walkdir::DirEntry::into_path)
            .collect();
        images.sort();

        if !images.is_empty() {
            tracing::info!("Found {} image(s) under {:?}", images.len(), input);
        }
        images
    }

    /// Whether `path` has one of the configured extensions and is not a sidecar.
    pub fn is_image(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.starts_with(APPLE_DOUBLE_PREFIX) {
            return false;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.formats.iter().any(|f| *f == ext)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery() -> ImageDiscovery {
        ImageDiscovery::new(&ProcessingConfig::default())
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_is_image() {
        let discovery = discovery();
        assert!(discovery.is_image(Path::new("test.jpg")));
        assert!(discovery.is_image(Path::new("test.JPG")));
        assert!(discovery.is_image(Path::new("test.jpeg")));
        assert!(discovery.is_image(Path::new("test.png")));
        assert!(discovery.is_image(Path::new("scan.TIFF")));
        assert!(discovery.is_image(Path::new("layered.psd")));
        assert!(!discovery.is_image(Path::new("test.webp")));
        assert!(!discovery.is_image(Path::new("test.txt")));
        assert!(!discovery.is_image(Path::new("noextension")));
        assert!(!discovery.is_image(Path::new("shot.jpg_original")));
        assert!(!discovery.is_image(Path::new("._shot.jpg")));
    }

    #[test]
    fn test_configured_formats_are_normalized() {
        let config = ProcessingConfig {
            supported_formats: vec![".JPG".to_string(), "Heic".to_string()],
            ..ProcessingConfig::default()
        };
        let discovery = ImageDiscovery::new(&config);
        assert!(discovery.is_image(Path::new("a.jpg")));
        assert!(discovery.is_image(Path::new("a.HEIC")));
        assert!(!discovery.is_image(Path::new("a.png")));
    }

    #[test]
    fn test_discover_walks_nested_folders_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("b_sub");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("c.png"), b"png").unwrap();
        std::fs::write(dir.path().join("a.JPG"), b"jpg").unwrap();
        std::fs::write(dir.path().join("._a.JPG"), b"sidecar").unwrap();
        std::fs::write(nested.join("d.tif"), b"tif").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"txt").unwrap();

        let images = discovery().discover(dir.path());
        assert_eq!(names(&images), vec!["a.JPG", "d.tif", "c.png"]);
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpeg");
        std::fs::write(&file, b"12345").unwrap();

        assert_eq!(discovery().discover(&file), vec![file]);
    }

    #[test]
    fn test_discover_unsupported_single_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("readme.md");
        std::fs::write(&file, b"# hi").unwrap();

        assert!(discovery().discover(&file).is_empty());
    }

    #[test]
    fn test_discover_folder_without_images_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"txt").unwrap();

        assert!(discovery().discover(dir.path()).is_empty());
    }
}
