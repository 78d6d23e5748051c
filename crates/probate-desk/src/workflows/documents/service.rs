use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::{DocumentGenerator, FormId, GeneratedDocument, GenerationError, LetterContext};
use crate::workflows::estate::{prepare_estate_data, NormalizedEstateData, ValidationReport};
use crate::workflows::matter::{Matter, MatterId, MatterRepository, RepositoryError};

/// Estate snapshot shown to the user before generating documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstateReview {
    pub matter_id: MatterId,
    pub estate: NormalizedEstateData,
    pub validation: ValidationReport,
}

/// Read-only: loads the matter's intake snapshot and generates from it.
pub struct DocumentService<R> {
    repository: Arc<R>,
    generator: DocumentGenerator,
}

impl<R> DocumentService<R>
where
    R: MatterRepository + 'static,
{
    pub fn new(repository: Arc<R>, generator: DocumentGenerator) -> Self {
        Self {
            repository,
            generator,
        }
    }

    pub fn review(&self, matter_id: &MatterId) -> Result<EstateReview, DocumentServiceError> {
        let matter = self.load(matter_id)?;
        let (estate, validation) = prepare_estate_data(&matter.intake);
        Ok(EstateReview {
            matter_id: matter.id,
            estate,
            validation,
        })
    }

    /// Generate `form_code` for the matter. Unknown codes are reported as not available.
    pub fn generate(
        &self,
        matter_id: &MatterId,
        form_code: &str,
        today: NaiveDate,
    ) -> Result<GeneratedDocument, DocumentServiceError> {
        let form = FormId::parse(form_code).ok_or_else(|| GenerationError::NotAvailable {
            form: form_code.to_string(),
        })?;
        let matter = self.load(matter_id)?;
        let (estate, _) = prepare_estate_data(&matter.intake);
        let context = LetterContext {
            letter_date: today,
            notices_mailed: matter
                .milestones
                .notices_mailed_at
                .map(|mailed_at| mailed_at.date_naive()),
        };

        match self.generator.generate(form, &estate, context) {
            Ok(document) => {
                info!(
                    matter_id = %matter.id,
                    form = form.code(),
                    bytes = document.bytes.len(),
                    warnings = document.warnings.len(),
                    "document generated"
                );
                Ok(document)
            }
            Err(GenerationError::Invalid { errors }) => {
                warn!(
                    matter_id = %matter.id,
                    form = form.code(),
                    errors = errors.len(),
                    "document refused: estate data incomplete"
                );
                Err(GenerationError::Invalid { errors }.into())
            }
            Err(other) => Err(other.into()),
        }
    }

    fn load(&self, matter_id: &MatterId) -> Result<Matter, DocumentServiceError> {
        self.repository
            .fetch(matter_id)?
            .ok_or(DocumentServiceError::Repository(RepositoryError::NotFound))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}
