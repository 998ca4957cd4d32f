use axum::extract::Multipart;

/// An uploaded PDF with its data and metadata.
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Pull the `pdf` field out of a multipart upload.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<UploadedFile, String> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "pdf" {
            let filename = field.file_name().unwrap_or("upload.pdf").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| format!("Failed to read file data: {}", e))?
                .to_vec();

            check_pdf(&filename, &data)?;
            file = Some(UploadedFile { filename, data });
        } else {
            // Ignore unknown fields
            let _ = field.bytes().await;
        }
    }

    file.ok_or_else(|| "No file uploaded".to_string())
}

/// Accept only PDFs, judged by extension and magic bytes.
fn check_pdf(filename: &str, data: &[u8]) -> Result<(), String> {
    let has_magic = data.starts_with(b"%PDF-");
    if filename.to_lowercase().ends_with(".pdf") {
        if !has_magic {
            return Err("File has .pdf extension but doesn't appear to be a valid PDF".to_string());
        }
        return Ok(());
    }
    if has_magic {
        return Ok(());
    }
    Err("Unsupported file type. Please upload a PDF file.".to_string())
}
