use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::catalog::error::{CatalogError, ValidationError};
use crate::database::repo::{Item, ItemStore, NewItem};
use crate::database::tags::split_tags;
use crate::media::filename::{is_valid_image, storage_filename};

#[derive(Debug, Clone)]
pub struct ImageFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A submission as received: every part is optional until validated.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub image: Option<ImageFile>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub id: i64,
    pub filename: String,
    pub image_path: String,
}

struct ValidUpload {
    image: ImageFile,
    title: String,
    description: String,
    tags: String,
}

/// Ingests images with their metadata and serves the stored items back.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn ItemStore>,
    upload_dir: PathBuf,
}

impl CatalogService {
    pub fn new(store: Arc<dyn ItemStore>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Validates the form, writes the image, then records the row.
    ///
    /// Every validation check runs before the first side effect, so a
    /// rejected form leaves neither a file nor a row behind. The file write
    /// and the insert are not atomic: if the insert fails, the written image
    /// stays on disk.
    pub fn upload(&self, form: UploadForm) -> Result<StoredUpload, CatalogError> {
        let upload = validate(form).inspect_err(|e| warn!("Rejected upload: {}", e))?;

        let filename = storage_filename(&upload.image.filename);
        let path = self.upload_dir.join(&filename);
        let mut file = File::options().write(true).create_new(true).open(&path)?;
        file.write_all(&upload.image.bytes)?;
        drop(file);

        let image_path = path.to_string_lossy().to_string();
        let record = NewItem {
            title: upload.title,
            description: upload.description,
            tags: split_tags(&upload.tags),
            image_path: image_path.clone(),
        };

        let id = self.store.insert(&record).inspect_err(|e| {
            error!("Failed to record item, leaving orphaned file {:?}: {}", path, e)
        })?;

        info!(id, %filename, bytes = upload.image.bytes.len(), "Stored upload");
        Ok(StoredUpload {
            id,
            filename,
            image_path,
        })
    }

    pub fn list_items(&self) -> Result<Vec<Item>, CatalogError> {
        Ok(self.store.list()?)
    }

    pub fn get_item(&self, id: i64) -> Result<Item, CatalogError> {
        self.store.get(id)?.ok_or(CatalogError::NotFound)
    }
}

fn validate(form: UploadForm) -> Result<ValidUpload, ValidationError> {
    let image = form.image.ok_or(ValidationError::MissingImage)?;

    let (Some(title), Some(description), Some(tags)) = (form.title, form.description, form.tags)
    else {
        return Err(ValidationError::MissingFields);
    };

    if image.filename.is_empty() {
        return Err(ValidationError::EmptyFilename);
    }
    if !is_valid_image(&image.filename) {
        return Err(ValidationError::InvalidFileType);
    }

    Ok(ValidUpload {
        image,
        title,
        description,
        tags,
    })
}
