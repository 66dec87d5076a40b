//! Multi-file label artwork upload
//!
//! Each file moves through pending, uploading and scanning on its own. A
//! failure marks that file failed and the batch carries on; files that already
//! completed stay stored.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::core::identity::EntityId;
use crate::core::store::{RecordStore, RecordStoreExt, StoreError};
use crate::entities::artwork::UploadStatus;
use crate::entities::Artwork;

/// Pulls ingredient names out of stored artwork. Extraction itself happens
/// elsewhere; implementations hand back whatever list they have.
pub trait ArtworkScanner {
    fn scan(&self, stored: &Path) -> Result<Vec<String>, String>;
}

/// Reads `<file>.ingredients.txt` next to the source file, one ingredient per
/// line. A missing sidecar yields an empty list.
pub struct SidecarScanner {
    source_dir: PathBuf,
}

impl SidecarScanner {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
        }
    }
}

impl ArtworkScanner for SidecarScanner {
    fn scan(&self, stored: &Path) -> Result<Vec<String>, String> {
        let Some(name) = stored.file_name() else {
            return Ok(Vec::new());
        };
        // stored names carry the artwork id: "<ART-id>_<original>"
        let original = name
            .to_string_lossy()
            .split_once('_')
            .map(|(_, rest)| rest.to_string())
            .unwrap_or_else(|| name.to_string_lossy().to_string());
        let sidecar = self.source_dir.join(format!("{}.ingredients.txt", original));
        if !sidecar.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&sidecar).map_err(|e| e.to_string())?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn set_status<S: RecordStore + ?Sized>(
    store: &mut S,
    artwork: &mut Artwork,
    status: UploadStatus,
) -> Result<(), StoreError> {
    artwork.status = status;
    store.update(artwork)?;
    tracing::debug!(id = %artwork.id, %status, "artwork status");
    Ok(())
}

fn process_one<S: RecordStore + ?Sized, C: ArtworkScanner + ?Sized>(
    store: &mut S,
    scanner: &C,
    artwork: &mut Artwork,
    source: &Path,
    dest_dir: &Path,
) -> Result<Result<(), String>, StoreError> {
    set_status(store, artwork, UploadStatus::Uploading)?;
    let bytes = match fs::read(source) {
        Ok(b) => b,
        Err(e) => return Ok(Err(format!("cannot read {}: {}", source.display(), e))),
    };
    let dest = dest_dir.join(format!("{}_{}", artwork.id, artwork.file_name));
    if let Err(e) = fs::write(&dest, &bytes) {
        return Ok(Err(format!("cannot store {}: {}", dest.display(), e)));
    }
    artwork.sha256 = Some(sha256_hex(&bytes));
    artwork.stored_path = Some(dest.to_string_lossy().to_string());

    set_status(store, artwork, UploadStatus::Scanning)?;
    match scanner.scan(&dest) {
        Ok(ingredients) => {
            artwork.extracted_ingredients = ingredients;
            Ok(Ok(()))
        }
        Err(e) => Ok(Err(format!("scan failed: {}", e))),
    }
}

/// Store every file under `dest_dir` and record one artwork row per file.
/// Returns the final state of each row, in input order.
pub fn upload_files<S: RecordStore + ?Sized, C: ArtworkScanner + ?Sized>(
    store: &mut S,
    scanner: &C,
    files: &[PathBuf],
    dest_dir: &Path,
    bom_id: Option<&EntityId>,
) -> Result<Vec<Artwork>, StoreError> {
    let mut results = Vec::with_capacity(files.len());
    let mut batch: Vec<Artwork> = Vec::with_capacity(files.len());

    for path in files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let artwork = Artwork::pending(file_name, bom_id.cloned());
        store.insert(&artwork)?;
        batch.push(artwork);
    }

    for (mut artwork, source) in batch.into_iter().zip(files) {
        match process_one(store, scanner, &mut artwork, source, dest_dir)? {
            Ok(()) => {
                artwork.status = UploadStatus::Completed;
                artwork.error = None;
            }
            Err(message) => {
                tracing::warn!(file = %artwork.file_name, %message, "artwork upload failed");
                artwork.fail(message);
            }
        }
        store.update(&artwork)?;
        results.push(artwork);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::SqliteStore;
    use tempfile::tempdir;

    struct FixedScanner(Vec<String>);

    impl ArtworkScanner for FixedScanner {
        fn scan(&self, _stored: &Path) -> Result<Vec<String>, String> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_each_file_tracked_independently() {
        let tmp = tempdir().unwrap();
        let dest = tmp.path().join("store");
        fs::create_dir_all(&dest).unwrap();
        let good = tmp.path().join("front.png");
        fs::write(&good, b"png bytes").unwrap();
        let missing = tmp.path().join("back.png");

        let mut store = SqliteStore::open_in_memory().unwrap();
        let scanner = FixedScanner(vec!["Kelp Meal".into()]);
        let results =
            upload_files(&mut store, &scanner, &[good, missing], &dest, None).unwrap();

        assert_eq!(results[0].status, UploadStatus::Completed);
        assert_eq!(results[0].extracted_ingredients, vec!["Kelp Meal"]);
        assert_eq!(results[0].sha256.as_deref(), Some(sha256_hex(b"png bytes").as_str()));
        assert_eq!(results[1].status, UploadStatus::Failed);
        assert!(results[1].error.as_deref().unwrap().contains("cannot read"));

        let stored: Vec<Artwork> = store.list().unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().any(|a| a.status == UploadStatus::Completed));
    }

    #[test]
    fn test_sidecar_scanner() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join("label.pdf.ingredients.txt"),
            "Kelp Meal\n\n Bone Meal \n",
        )
        .unwrap();
        let scanner = SidecarScanner::new(tmp.path());
        let found = scanner
            .scan(Path::new("/x/ART-01ABC_label.pdf"))
            .unwrap();
        assert_eq!(found, vec!["Kelp Meal", "Bone Meal"]);
        assert!(scanner.scan(Path::new("/x/ART-01ABC_other.pdf")).unwrap().is_empty());
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
