use anyhow::{Context, Result};
use cloudpdf::library::{Library, Session, UploadState};
use std::path::Path;
use uuid::Uuid;

pub async fn upload<P: AsRef<Path>>(library: &Library, session: &Session, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("upload.pdf");

    let task = library.upload(session, file_name, bytes)?;
    let mut progress = task.subscribe();

    let reporter = tokio::spawn(async move {
        let mut last_percent = None;
        while progress.changed().await.is_ok() {
            let state = progress.borrow_and_update().clone();
            match state {
                UploadState::Progressing(fraction) => {
                    let percent = (fraction * 100.0).floor() as u32;
                    if last_percent != Some(percent) {
                        eprint!("\rUploading... {:>3}%", percent);
                        last_percent = Some(percent);
                    }
                }
                UploadState::Completed(_) | UploadState::Failed(_) => break,
            }
        }
        eprintln!();
    });

    let result = task.finish().await;
    let _ = reporter.await;
    let record = result.with_context(|| format!("Failed to upload {}", path.display()))?;

    println!(
        "Uploaded {} as {} ({} bytes)",
        record.file_name, record.id, record.size
    );
    println!("Stored at {}", library.blob_path(&record).display());
    Ok(())
}

pub async fn list(library: &Library, session: &Session, json: bool) -> Result<()> {
    let records = library.list(session).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No files uploaded yet.");
        return Ok(());
    }

    for record in &records {
        println!(
            "{}  {}  {:>10}  {}",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.size,
            record.file_name
        );
    }
    println!("\n{} file(s).", records.len());
    Ok(())
}

pub async fn delete(library: &Library, session: &Session, id: Uuid) -> Result<()> {
    let record = library.delete(session, id).await?;
    println!("Deleted {} ({})", record.file_name, record.id);
    Ok(())
}
