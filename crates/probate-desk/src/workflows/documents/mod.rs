//! Court form and letter generation.
//!
//! Structured court forms are assembled as PDFs from estate data, cover letters are filled
//! from templates and packaged as DOCX, and the wills notice search request is rendered
//! through a headless browser. Every path validates the estate first and refuses to produce
//! a document while errors remain.

mod catalog;
mod docx;
mod layout;
mod pdf;
mod renderer;
pub mod service;
mod templates;

use std::sync::Arc;

use mime::Mime;

pub use catalog::{availability, is_form_available, CoverLetterKind, FormAvailability, FormId};
pub use docx::{package_docx, DOCX_CONTENT_TYPE};
pub use layout::{build_form_content, FormContent, Section};
pub use pdf::{page_count, render_pdf, LINES_PER_PAGE};
pub use renderer::{HeadlessChromium, HtmlRenderer, RenderError};
pub use service::{DocumentService, DocumentServiceError, EstateReview};
pub use templates::{fill_template, LetterContext, Paragraph};

use crate::workflows::estate::{validate_estate_data_detailed, FieldIssue, NormalizedEstateData};
use crate::workflows::fees::FeeSchedule;

/// A finished document ready to stream back to the caller.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub form: FormId,
    pub file_name: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
    /// Validation warnings; the document is produced but should be reviewed.
    pub warnings: Vec<FieldIssue>,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("form `{form}` is not available")]
    NotAvailable { form: String },
    #[error("form `{}` is not a structured court form", .form.code())]
    NotStructured { form: FormId },
    #[error("estate data is incomplete ({} error(s))", .errors.len())]
    Invalid { errors: Vec<FieldIssue> },
    #[error("pdf assembly failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("docx packaging failed: {0}")]
    Docx(#[from] zip::result::ZipError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Structured PDF for one of the court forms, using the statutory fee schedule.
pub fn generate_form(
    form: FormId,
    data: &NormalizedEstateData,
) -> Result<GeneratedDocument, GenerationError> {
    generate_structured(form, data, &FeeSchedule::default())
}

/// DOCX cover letter filled from the estate.
pub fn generate_cover_letter(
    kind: CoverLetterKind,
    data: &NormalizedEstateData,
    context: LetterContext,
) -> Result<GeneratedDocument, GenerationError> {
    let warnings = ensure_valid(data)?;
    let markup = templates::fill_template(
        templates::template_for(kind),
        &templates::letter_values(data, context),
    );
    let bytes = package_docx(&templates::paragraphs(&markup))?;
    let form = match kind {
        CoverLetterKind::WillSearch => FormId::CoverLetterWillSearch,
        CoverLetterKind::Notice => FormId::CoverLetterNotice,
        CoverLetterKind::Filing => FormId::CoverLetterFiling,
    };

    Ok(GeneratedDocument {
        form,
        file_name: file_name(data, form, "docx"),
        content_type: DOCX_CONTENT_TYPE
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        bytes,
        warnings,
    })
}

/// Dispatches every catalogued form to its generation strategy.
#[derive(Clone)]
pub struct DocumentGenerator {
    fees: FeeSchedule,
    renderer: Arc<dyn HtmlRenderer>,
}

impl DocumentGenerator {
    pub fn new(fees: FeeSchedule, renderer: Arc<dyn HtmlRenderer>) -> Self {
        Self { fees, renderer }
    }

    pub fn generate(
        &self,
        form: FormId,
        data: &NormalizedEstateData,
        context: LetterContext,
    ) -> Result<GeneratedDocument, GenerationError> {
        match availability(form) {
            FormAvailability::StructuredPdf => generate_structured(form, data, &self.fees),
            FormAvailability::CoverLetterDocx { kind } => {
                generate_cover_letter(kind, data, context)
            }
            FormAvailability::BrowserRendered => {
                let warnings = ensure_valid(data)?;
                let html = templates::will_search_request_html(data, context);
                let bytes = self.renderer.render_pdf(&html)?;
                Ok(GeneratedDocument {
                    form,
                    file_name: file_name(data, form, "pdf"),
                    content_type: mime::APPLICATION_PDF,
                    bytes,
                    warnings,
                })
            }
            FormAvailability::NotAvailable => Err(GenerationError::NotAvailable {
                form: form.code().to_string(),
            }),
        }
    }
}

fn generate_structured(
    form: FormId,
    data: &NormalizedEstateData,
    fees: &FeeSchedule,
) -> Result<GeneratedDocument, GenerationError> {
    match availability(form) {
        FormAvailability::StructuredPdf => {}
        FormAvailability::NotAvailable => {
            return Err(GenerationError::NotAvailable {
                form: form.code().to_string(),
            })
        }
        _ => return Err(GenerationError::NotStructured { form }),
    }

    let warnings = ensure_valid(data)?;
    let content = build_form_content(form, data, fees);
    let bytes = render_pdf(&content)?;

    Ok(GeneratedDocument {
        form,
        file_name: file_name(data, form, "pdf"),
        content_type: mime::APPLICATION_PDF,
        bytes,
        warnings,
    })
}

fn ensure_valid(data: &NormalizedEstateData) -> Result<Vec<FieldIssue>, GenerationError> {
    let report = validate_estate_data_detailed(data);
    if report.valid {
        Ok(report.warnings)
    } else {
        Err(GenerationError::Invalid {
            errors: report.errors,
        })
    }
}

fn file_name(data: &NormalizedEstateData, form: FormId, extension: &str) -> String {
    let stem: String = data
        .estate
        .case_code
        .as_deref()
        .unwrap_or("estate")
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '-' })
        .collect();
    format!("{stem}-{}.{extension}", form.code().replace('_', "-"))
}
