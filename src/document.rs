//! Document translation lifecycle
//!
//! One `translate_document` call drives a multi-phase job: the input is
//! resolved to bytes and uploaded, the job is polled on a fixed interval
//! until it leaves the queued/translating states, and the result is streamed
//! to the output destination. When minification is enabled and applicable,
//! the upload is preceded by a media-stripping pass and the download followed
//! by the reverse pass.
//!
//! Any failure after a successful upload surfaces as
//! [`Error::DocumentTranslation`] carrying the [`DocumentHandle`], so the
//! caller can resume polling and downloading manually.

use crate::client::Translator;
use crate::error::{check_status, classify_status, Error, MinifyError, RequestContext, Result};
use crate::minify::DocumentMinifier;
use crate::transport::{FileUpload, RequestOptions};
use crate::types::{DocumentHandle, DocumentStatus, Formality};
use futures::TryStreamExt;
use reqwest::Method;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::{debug, info};

/// Source of the document to translate
///
/// Non-path inputs must carry a filename: the service derives the document
/// format from its extension. All variants are resolved to bytes plus a
/// filename at the API boundary, before any network activity.
pub enum DocumentInput {
    /// Read the document from a file on disk
    Path(PathBuf),
    /// Use an in-memory buffer
    Bytes {
        /// Filename reported to the service (used for format detection)
        filename: String,
        /// Raw document bytes
        data: Vec<u8>,
    },
    /// Read the document from an async reader
    Stream {
        /// Filename reported to the service (used for format detection)
        filename: String,
        /// The reader supplying the document bytes
        reader: Box<dyn AsyncRead + Send + Unpin>,
    },
}

impl DocumentInput {
    /// Input from a file path
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Input from an in-memory buffer
    pub fn bytes(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self::Bytes {
            filename: filename.into(),
            data,
        }
    }

    /// Input from an async reader
    pub fn stream(
        filename: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self::Stream {
            filename: filename.into(),
            reader: Box::new(reader),
        }
    }

    /// Resolve to (filename, bytes); the rest of the lifecycle only ever
    /// sees this form.
    async fn materialize(self) -> Result<(String, Vec<u8>)> {
        match self {
            DocumentInput::Path(path) => {
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| Error::Config {
                        message: format!("input path {} has no file name", path.display()),
                        key: None,
                    })?;
                let data = tokio::fs::read(&path).await?;
                Ok((filename, data))
            }
            DocumentInput::Bytes { filename, data } => Ok((filename, data)),
            DocumentInput::Stream {
                filename,
                mut reader,
            } => {
                let mut data = Vec::new();
                reader.read_to_end(&mut data).await?;
                Ok((filename, data))
            }
        }
    }
}

/// Destination for the translated document
pub enum DocumentOutput {
    /// Write to a file path; the file is created exclusively and must not
    /// already exist
    Path(PathBuf),
    /// Stream into an async writer
    Writer(Box<dyn AsyncWrite + Send + Unpin>),
}

impl DocumentOutput {
    /// Output to a file path
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Output into an async writer
    pub fn writer(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self::Writer(Box::new(writer))
    }
}

/// Options for document translation
#[derive(Clone, Debug, Default)]
pub struct DocumentTranslateOptions {
    /// Desired formality of the translation
    pub formality: Option<Formality>,

    /// ID of a glossary to apply during translation
    pub glossary_id: Option<String>,

    /// Output file format override (e.g. "pdf" source converted to "docx")
    pub output_format: Option<String>,

    /// Strip embedded media before upload and restore it after download
    ///
    /// Only applies when the input is a file path with a supported
    /// extension and the output is a file path; otherwise it is ignored.
    pub enable_minification: bool,

    /// Additional parameters passed through to the upload endpoint verbatim
    pub extra_params: Vec<(String, String)>,
}

/// Private sink resolved from [`DocumentOutput`] after the exclusive create
enum OutputSink {
    File {
        file: tokio::fs::File,
        path: PathBuf,
    },
    Writer(Box<dyn AsyncWrite + Send + Unpin>),
}

impl Translator {
    /// Translate a document end to end: upload, poll until done, download.
    ///
    /// When `output` is a path, the file is created with create-exclusive
    /// semantics before any network activity and deleted again on failure, so
    /// a half-written result never survives. On any failure after a
    /// successful upload, the returned [`Error::DocumentTranslation`] carries
    /// the job's [`DocumentHandle`] for manual resumption via
    /// [`wait_for_document_completion`](Self::wait_for_document_completion)
    /// and [`download_document`](Self::download_document).
    pub async fn translate_document(
        &self,
        input: DocumentInput,
        output: DocumentOutput,
        source_lang: Option<&str>,
        target_lang: &str,
        options: DocumentTranslateOptions,
    ) -> Result<DocumentStatus> {
        // Minification applies only to path-to-path translations of
        // supported document types; otherwise the raw input is uploaded
        let minify = options.enable_minification
            && matches!(&output, DocumentOutput::Path(_))
            && matches!(&input, DocumentInput::Path(p) if DocumentMinifier::can_minify(p));

        // Open the output exclusively before any network activity; a
        // pre-existing file fails the whole call without a single request
        let sink = match output {
            DocumentOutput::Path(path) => {
                let file = tokio::fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&path)
                    .await
                    .map_err(|e| Error::DocumentTranslation {
                        handle: None,
                        source: Box::new(Error::Io(e)),
                    })?;
                OutputSink::File { file, path }
            }
            DocumentOutput::Writer(writer) => OutputSink::Writer(writer),
        };
        let created_path = match &sink {
            OutputSink::File { path, .. } => Some(path.clone()),
            OutputSink::Writer(_) => None,
        };

        let mut uploaded: Option<DocumentHandle> = None;
        let result = self
            .translate_document_inner(input, sink, source_lang, target_lang, &options, minify, &mut uploaded)
            .await;

        match result {
            Ok(status) => Ok(status),
            Err(e) => {
                // Never leave a partially written output file behind
                if let Some(path) = &created_path {
                    let _ = tokio::fs::remove_file(path).await;
                }
                Err(Error::DocumentTranslation {
                    handle: uploaded,
                    source: Box::new(e),
                })
            }
        }
    }

    /// The happy-path body of `translate_document`; every error it returns is
    /// wrapped exactly once by the caller.
    #[allow(clippy::too_many_arguments)]
    async fn translate_document_inner(
        &self,
        input: DocumentInput,
        sink: OutputSink,
        source_lang: Option<&str>,
        target_lang: &str,
        options: &DocumentTranslateOptions,
        minify: bool,
        uploaded: &mut Option<DocumentHandle>,
    ) -> Result<DocumentStatus> {
        let minifier = if minify {
            Some(Arc::new(DocumentMinifier::new()?))
        } else {
            None
        };

        // Strip media before upload when minifying
        let input = match (&minifier, input) {
            (Some(minifier), DocumentInput::Path(path)) => {
                let session = Arc::clone(minifier);
                let source = path.clone();
                let minified =
                    tokio::task::spawn_blocking(move || session.minify_document(&source, true))
                        .await
                        .map_err(|e| {
                            Error::Minification(MinifyError::Extraction {
                                archive: path,
                                reason: format!("minification task failed: {e}"),
                            })
                        })??;
                DocumentInput::Path(minified)
            }
            (_, input) => input,
        };

        let (filename, data) = input.materialize().await?;
        let handle = self
            .upload_document(&filename, data, source_lang, target_lang, options)
            .await?;
        *uploaded = Some(handle.clone());
        info!(document_id = %handle.document_id, "document uploaded");

        let status = self.wait_for_document_completion(&handle).await?;

        match sink {
            OutputSink::File { mut file, path } => {
                self.download_document_to(&handle, &mut file).await?;
                file.flush().await?;
                drop(file);

                // Reinsert the original media in place
                if let Some(minifier) = minifier {
                    let destination = path.clone();
                    tokio::task::spawn_blocking(move || {
                        minifier.deminify_document(&destination, &destination, true)
                    })
                    .await
                    .map_err(|e| {
                        Error::Deminification(MinifyError::Extraction {
                            archive: path,
                            reason: format!("deminification task failed: {e}"),
                        })
                    })??;
                }
            }
            OutputSink::Writer(mut writer) => {
                self.download_document_to(&handle, &mut *writer).await?;
                writer.flush().await?;
            }
        }

        Ok(status)
    }

    /// Upload a document for translation, returning the job handle.
    ///
    /// The filename is mandatory: the service derives the document format
    /// from its extension.
    pub async fn upload_document(
        &self,
        filename: &str,
        data: Vec<u8>,
        source_lang: Option<&str>,
        target_lang: &str,
        options: &DocumentTranslateOptions,
    ) -> Result<DocumentHandle> {
        let mut fields: Vec<(String, String)> = Vec::new();
        if let Some(source) = source_lang {
            fields.push(("source_lang".to_string(), source.to_string()));
        }
        fields.push(("target_lang".to_string(), target_lang.to_string()));
        fields.push(("filename".to_string(), filename.to_string()));
        if let Some(formality) = options.formality {
            if formality != Formality::Default {
                fields.push(("formality".to_string(), formality.as_str().to_string()));
            }
        }
        if let Some(glossary_id) = &options.glossary_id {
            fields.push(("glossary_id".to_string(), glossary_id.clone()));
        }
        if let Some(output_format) = &options.output_format {
            fields.push(("output_format".to_string(), output_format.clone()));
        }
        fields.extend(options.extra_params.iter().cloned());

        let request = RequestOptions {
            data: fields,
            file: Some(FileUpload {
                filename: filename.to_string(),
                data,
            }),
            headers: Vec::new(),
        };
        let response = self
            .transport
            .send_request(Method::POST, "/v2/document", request)
            .await?;
        check_status(response.status, &response.content, RequestContext::default())?;
        response.json()
    }

    /// Poll the current status of a document translation job.
    pub async fn get_document_status(&self, handle: &DocumentHandle) -> Result<DocumentStatus> {
        let path = format!("/v2/document/{}", handle.document_id);
        let options = RequestOptions::with_data(vec![(
            "document_key".to_string(),
            handle.document_key.clone(),
        )]);
        let response = self.transport.send_request(Method::POST, &path, options).await?;
        check_status(response.status, &response.content, RequestContext::default())?;
        response.json()
    }

    /// Poll a job on the configured fixed interval until it completes.
    ///
    /// The service's `seconds_remaining` estimate is unreliable and is not
    /// used to size the wait. Returns the final status once the job is done,
    /// or [`Error::DocumentFailed`] if the service reports failure.
    pub async fn wait_for_document_completion(
        &self,
        handle: &DocumentHandle,
    ) -> Result<DocumentStatus> {
        loop {
            let status = self.get_document_status(handle).await?;
            if status.done() {
                info!(
                    document_id = %handle.document_id,
                    billed_characters = status.billed_characters,
                    "document translation done"
                );
                return Ok(status);
            }
            if !status.ok() {
                let message = match status.error_message {
                    Some(message) => message,
                    None => format!("document entered {} state", status.status),
                };
                return Err(Error::DocumentFailed(message));
            }
            debug!(
                document_id = %handle.document_id,
                state = %status.status,
                "document not ready, waiting before next poll"
            );
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Download the translated result of a completed job.
    ///
    /// The response body is streamed directly to the destination without
    /// buffering the whole document. A path destination is created
    /// exclusively and removed again if the download fails.
    pub async fn download_document(
        &self,
        handle: &DocumentHandle,
        output: DocumentOutput,
    ) -> Result<()> {
        match output {
            DocumentOutput::Path(path) => {
                let mut file = tokio::fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&path)
                    .await?;
                let result = self.download_document_to(handle, &mut file).await;
                match result {
                    Ok(()) => {
                        file.flush().await?;
                        Ok(())
                    }
                    Err(e) => {
                        drop(file);
                        let _ = tokio::fs::remove_file(&path).await;
                        Err(e)
                    }
                }
            }
            DocumentOutput::Writer(mut writer) => {
                self.download_document_to(handle, &mut *writer).await?;
                writer.flush().await?;
                Ok(())
            }
        }
    }

    /// Stream the result body into a writer.
    ///
    /// A 503 here classifies as [`Error::DocumentNotReady`]; the polling loop
    /// normally prevents it, so seeing one after `done()` indicates a
    /// service-side inconsistency and propagates as a hard failure.
    async fn download_document_to(
        &self,
        handle: &DocumentHandle,
        writer: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<()> {
        let path = format!("/v2/document/{}/result", handle.document_id);
        let options = RequestOptions::with_data(vec![(
            "document_key".to_string(),
            handle.document_key.clone(),
        )]);
        let response = self
            .transport
            .send_request_streaming(Method::POST, &path, options)
            .await?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            let content = response.text().await.unwrap_or_default();
            return Err(classify_status(
                status,
                &content,
                RequestContext::document_download(),
            ));
        }

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let mut reader = StreamReader::new(stream);
        tokio::io::copy(&mut reader, writer).await?;
        Ok(())
    }
}
