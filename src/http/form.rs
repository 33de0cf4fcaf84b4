use axum::extract::multipart::{Multipart, MultipartError};

use crate::catalog::{ImageFile, UploadForm};

/// Collects the upload parts. A part is the image only if it is named
/// `image` and carries a filename; text fields are parts without one.
/// When a field repeats, the first occurrence wins.
pub(crate) async fn read_upload_form(
    mut multipart: Multipart,
) -> Result<UploadForm, MultipartError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match field.file_name().map(str::to_owned) {
            Some(filename) => {
                if name == "image" && form.image.is_none() {
                    let bytes = field.bytes().await?;
                    form.image = Some(ImageFile {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            None => {
                let slot = match name.as_str() {
                    "title" => &mut form.title,
                    "description" => &mut form.description,
                    "tags" => &mut form.tags,
                    _ => continue,
                };
                if slot.is_none() {
                    *slot = Some(field.text().await?);
                }
            }
        }
    }

    Ok(form)
}
