use axum::extract::Multipart;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::data::SourceKind;

use super::models::UploadRequest;
use super::process::ServerError;

const FILE_FIELD: &str = "file";
const BODY_FRAMING_BYTES: usize = 64 * 1024;

#[derive(Debug)]
pub(crate) struct Upload {
    pub(crate) name: String,
    pub(crate) bytes: Vec<u8>,
    pub(crate) extension: String,
}

pub(crate) fn decode_upload(request: UploadRequest) -> Result<Upload, ServerError> {
    let name = upload_name(request.data_name.as_deref())?;
    let encoded = request.data_base64.unwrap_or_default();
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(ServerError::bad_request("no file uploaded"));
    }
    let extension = upload_extension(&name)?;

    let bytes = BASE64
        .decode(encoded)
        .map_err(|err| ServerError::bad_request(format!("invalid base64 data: {}", err)))?;
    Ok(Upload {
        name,
        bytes,
        extension,
    })
}

/// Reads the `file` part of a `multipart/form-data` body; other parts are
/// ignored.
pub(crate) async fn read_multipart_upload(mut multipart: Multipart) -> Result<Upload, ServerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::bad_request(format!("invalid multipart body: {}", err)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = upload_name(field.file_name())?;
        let extension = upload_extension(&name)?;
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ServerError::bad_request(format!("failed to read file part: {}", err)))?;
        if bytes.is_empty() {
            return Err(ServerError::bad_request("no file uploaded"));
        }
        return Ok(Upload {
            name,
            bytes: bytes.to_vec(),
            extension,
        });
    }
    Err(ServerError::bad_request("no file part"))
}

/// Largest request body that can carry a `max_file_bytes` file: base64
/// grows the payload by 4/3, plus room for the JSON or multipart framing.
pub(crate) fn request_body_limit(max_file_bytes: usize) -> usize {
    max_file_bytes
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(BODY_FRAMING_BYTES)
}

fn upload_name(name: Option<&str>) -> Result<String, ServerError> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ServerError::bad_request("no file selected"));
    }
    Ok(name.to_string())
}

fn upload_extension(name: &str) -> Result<String, ServerError> {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if SourceKind::from_extension(&extension).is_none() {
        return Err(ServerError::bad_request(
            "unsupported file type, upload a PDF or an image file",
        ));
    }
    Ok(extension)
}

/// Uniquely named copy of the upload; removed when the handle is dropped.
pub(crate) fn write_upload(upload: &Upload, dir: &Path) -> Result<NamedTempFile, ServerError> {
    std::fs::create_dir_all(dir).map_err(|err| {
        ServerError::internal(format!(
            "failed to create upload dir {}: {}",
            dir.display(),
            err
        ))
    })?;
    let suffix = format!(".{}", upload.extension);
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&suffix)
        .tempfile_in(dir)
        .map_err(|err| ServerError::internal(format!("failed to store upload: {}", err)))?;
    file.write_all(&upload.bytes)
        .and_then(|_| file.flush())
        .map_err(|err| ServerError::internal(format!("failed to store upload: {}", err)))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: Option<&str>, data: Option<&str>) -> UploadRequest {
        UploadRequest {
            data_base64: data.map(str::to_string),
            data_name: name.map(str::to_string),
        }
    }

    #[test]
    fn upload_needs_name_data_and_known_extension() {
        let err = decode_upload(request(None, Some("aGk="))).unwrap_err();
        assert_eq!(err.message, "no file selected");
        let err = decode_upload(request(Some("a.png"), Some("  "))).unwrap_err();
        assert_eq!(err.message, "no file uploaded");
        assert!(decode_upload(request(Some("a.gif"), Some("aGk="))).is_err());
        assert!(decode_upload(request(Some("a.png"), Some("***"))).is_err());

        let upload = decode_upload(request(Some("Scan.PDF"), Some("aGk="))).expect("upload");
        assert_eq!(upload.bytes, b"hi");
        assert_eq!(upload.extension, "pdf");
    }

    #[test]
    fn body_limit_leaves_room_for_base64() {
        assert_eq!(request_body_limit(3), 4 + 64 * 1024);
        assert_eq!(request_body_limit(4), 8 + 64 * 1024);
        let file = 50 * 1024 * 1024;
        assert!(request_body_limit(file) >= file / 3 * 4);
        assert_eq!(request_body_limit(usize::MAX), usize::MAX);
    }

    #[test]
    fn upload_file_keeps_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let upload = Upload {
            name: "x.png".to_string(),
            bytes: vec![1, 2, 3],
            extension: "png".to_string(),
        };
        let file = write_upload(&upload, &dir.path().join("uploads")).expect("write");
        assert!(file.path().to_string_lossy().ends_with(".png"));
        assert_eq!(std::fs::read(file.path()).expect("read"), vec![1, 2, 3]);
    }
}
