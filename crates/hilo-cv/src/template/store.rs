//! Template persistence: a directory of grayscale rank images.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use hilo_core::Rank;
use image::{GrayImage, RgbImage, imageops};
use log::{debug, info, warn};

use crate::Result;

/// Extensions recognised when scanning the template directory.
const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// In-memory rank templates backed by a directory of image files.
///
/// At most one template per rank is held; a later file or `add` for the
/// same rank replaces the earlier one. Iteration runs in ascending rank
/// order, which keeps match tie-breaking deterministic.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
    templates: BTreeMap<Rank, GrayImage>,
}

impl TemplateStore {
    /// Create a store backed by `dir` and load whatever it holds.
    ///
    /// A missing or empty directory is not an error: matching simply
    /// reports every candidate as unknown until templates are learned.
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        let mut store = Self::empty(dir);
        store.load_dir();
        store
    }

    /// Create an empty store backed by `dir` without touching the disk.
    pub fn empty<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            templates: BTreeMap::new(),
        }
    }

    /// Replace the whole template set by re-scanning the backing directory.
    ///
    /// The rank label is the file stem up to the first `_`, so `K.png` and
    /// `10_hearts.png` both work. Files that fail to decode or do not name
    /// a rank are skipped with a warning, never fatal.
    pub fn load_dir(&mut self) {
        self.templates.clear();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "template directory {} unavailable ({err}); all cards will be unknown",
                    self.dir.display()
                );
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
                continue;
            };
            if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
                continue;
            }
            match load_template(&path) {
                Ok((rank, image)) => {
                    self.templates.insert(rank, image);
                }
                Err(err) => warn!("skipping template {}: {err:#}", path.display()),
            }
        }
        if self.templates.is_empty() {
            warn!(
                "no templates loaded from {}; all cards will be unknown",
                self.dir.display()
            );
        } else {
            info!(
                "loaded {} rank templates from {}",
                self.templates.len(),
                self.dir.display()
            );
        }
    }

    /// Learn or correct a rank's template from a colour candidate crop.
    ///
    /// The in-memory entry is live for the very next match even when
    /// persisting to the backing directory fails.
    pub fn add(&mut self, rank: Rank, candidate: &RgbImage) -> Result<()> {
        let gray = imageops::grayscale(candidate);
        self.templates.insert(rank, gray.clone());
        self.persist(rank, &gray)
    }

    fn persist(&self, rank: Rank, image: &GrayImage) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create template directory {}", self.dir.display())
        })?;
        let path = self.template_path(rank);
        image
            .save(&path)
            .with_context(|| format!("failed to save template {}", path.display()))?;
        debug!("saved template for {rank} to {}", path.display());
        Ok(())
    }

    /// On-disk location for a rank's template.
    pub fn template_path(&self, rank: Rank) -> PathBuf {
        self.dir.join(format!("{}.png", rank.label()))
    }

    /// All templates in ascending rank order.
    pub fn all(&self) -> impl Iterator<Item = (Rank, &GrayImage)> + '_ {
        self.templates.iter().map(|(rank, image)| (*rank, image))
    }

    pub fn get(&self, rank: Rank) -> Option<&GrayImage> {
        self.templates.get(&rank)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn load_template(path: &Path) -> Result<(Rank, GrayImage)> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let label = stem.split('_').next().unwrap_or_default();
    let rank: Rank = label
        .parse()
        .with_context(|| format!("stem '{stem}' does not start with a rank label"))?;
    let image = image::open(path)
        .with_context(|| "failed to decode image")?
        .to_luma8();
    Ok((rank, image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::tempdir;

    fn sample_crop(value: u8) -> RgbImage {
        RgbImage::from_pixel(20, 30, Rgb([value, value, value]))
    }

    #[test]
    fn add_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let mut store = TemplateStore::empty(dir.path());
        store.add(Rank::King, &sample_crop(180)).unwrap();
        assert_eq!(store.len(), 1);
        assert!(dir.path().join("K.png").exists());

        let reopened = TemplateStore::open(dir.path());
        assert_eq!(reopened.len(), 1);
        assert_eq!(
            reopened.get(Rank::King).unwrap().dimensions(),
            (20, 30)
        );
    }

    #[test]
    fn stem_before_underscore_names_the_rank() {
        let dir = tempdir().unwrap();
        let gray = GrayImage::from_pixel(10, 14, image::Luma([200u8]));
        gray.save(dir.path().join("10_hearts.png")).unwrap();

        let store = TemplateStore::open(dir.path());
        assert_eq!(store.len(), 1);
        assert!(store.get(Rank::Ten).is_some());
    }

    #[test]
    fn undecodable_and_unlabelled_files_are_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Q.png"), b"not an image").unwrap();
        let gray = GrayImage::from_pixel(10, 14, image::Luma([200u8]));
        gray.save(dir.path().join("joker.png")).unwrap();
        gray.save(dir.path().join("A.png")).unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let store = TemplateStore::open(dir.path());
        assert_eq!(store.len(), 1);
        assert!(store.get(Rank::Ace).is_some());
    }

    #[test]
    fn missing_directory_yields_empty_store() {
        let dir = tempdir().unwrap();
        let store = TemplateStore::open(dir.path().join("nope"));
        assert!(store.is_empty());
    }

    #[test]
    fn later_add_replaces_earlier_template() {
        let dir = tempdir().unwrap();
        let mut store = TemplateStore::empty(dir.path());
        store.add(Rank::Five, &sample_crop(100)).unwrap();
        store.add(Rank::Five, &sample_crop(220)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(Rank::Five).unwrap().get_pixel(0, 0).0[0], 220);
    }

    #[test]
    fn iteration_is_in_ascending_rank_order() {
        let dir = tempdir().unwrap();
        let mut store = TemplateStore::empty(dir.path());
        store.add(Rank::Ace, &sample_crop(10)).unwrap();
        store.add(Rank::Two, &sample_crop(20)).unwrap();
        store.add(Rank::Jack, &sample_crop(30)).unwrap();

        let order: Vec<Rank> = store.all().map(|(rank, _)| rank).collect();
        assert_eq!(order, vec![Rank::Two, Rank::Jack, Rank::Ace]);
    }
}
