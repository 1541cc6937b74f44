use crate::chunking::Chunker;
use crate::error::IngestError;
use crate::extractor::extract_page_texts;
use crate::models::{DocumentFingerprint, EvidenceUnit};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub struct SkippedPdf {
    pub path: PathBuf,
    pub reason: String,
}

pub struct DocumentSummary {
    pub fingerprint: DocumentFingerprint,
    pub unit_count: usize,
}

pub struct IngestionReport {
    pub units: Vec<EvidenceUnit>,
    pub documents: Vec<DocumentSummary>,
    pub skipped_files: Vec<SkippedPdf>,
}

/// Chunk every PDF under `folder`, best effort: unreadable files are
/// reported in `skipped_files` instead of failing the whole run. Documents
/// are independent of one another; each keeps its own unit ordering.
pub fn ingest_folder_units(folder: &Path, chunker: &Chunker) -> Result<IngestionReport, IngestError> {
    let files = discover_pdf_files(folder);

    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no pdf files found in {}",
            folder.display()
        )));
    }

    let mut units = Vec::new();
    let mut documents = Vec::new();
    let mut skipped_files = Vec::new();

    for path in files {
        match ingest_single_pdf(&path, chunker) {
            Ok((fingerprint, file_units)) => {
                documents.push(DocumentSummary {
                    fingerprint,
                    unit_count: file_units.len(),
                });
                units.extend(file_units);
            }
            Err(error) => skipped_files.push(SkippedPdf {
                path,
                reason: error.to_string(),
            }),
        }
    }

    Ok(IngestionReport {
        units,
        documents,
        skipped_files,
    })
}

pub fn ingest_single_pdf(
    path: &Path,
    chunker: &Chunker,
) -> Result<(DocumentFingerprint, Vec<EvidenceUnit>), IngestError> {
    let fingerprint = build_document_fingerprint(path)?;
    let pages = extract_page_texts(path)?;
    let units = chunker.chunk(&pages, &fingerprint.filename);
    Ok((fingerprint, units))
}

fn build_document_fingerprint(path: &Path) -> Result<DocumentFingerprint, IngestError> {
    let checksum = digest_file(path)?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?;

    Ok(DocumentFingerprint {
        document_id: generate_document_id(path),
        filename: name.to_string(),
        source_path: path.to_string_lossy().to_string(),
        checksum,
        ingested_at: Utc::now(),
    })
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}
