use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Language;

#[derive(Debug, Clone)]
pub struct DiagnosisRequest {
    pub image: Vec<u8>,
    pub language: Language,
}

/// What the diagnosis backend returns for a leaf photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Raw class label, e.g. `Tomato___Late_blight`.
    pub disease: String,
    pub confidence: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DiagnosisError {
    /// The service could not be reached.
    #[error("Diagnosis service unreachable: {0}")]
    Network(String),
    /// The service answered but could not produce a diagnosis.
    #[error("Diagnosis failed: {0}")]
    Processing(String),
}

impl DiagnosisError {
    /// Translation key the UI shows for this failure.
    pub fn message_key(&self) -> &'static str {
        match self {
            DiagnosisError::Network(_) => "errorNetwork",
            DiagnosisError::Processing(_) => "errorProcessing",
        }
    }
}

impl Diagnosis {
    pub fn new(
        disease: impl Into<String>,
        confidence: f64,
        recommendation: impl Into<String>,
    ) -> Result<Self, DiagnosisError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(DiagnosisError::Processing(format!(
                "confidence {} outside [0, 1]",
                confidence
            )));
        }
        Ok(Self {
            disease: disease.into(),
            confidence,
            recommendation: recommendation.into(),
        })
    }

    /// Label with the dataset's underscore separators turned into spaces.
    pub fn display_label(&self) -> String {
        self.disease.replace("___", " ").replace('_', " ")
    }

    pub fn confidence_percent(&self) -> String {
        format!("{:.2}%", self.confidence * 100.0)
    }
}

/// Plant-disease diagnosis from an image.
#[async_trait]
pub trait DiagnosisService: Send + Sync {
    async fn diagnose(&self, request: DiagnosisRequest) -> Result<Diagnosis, DiagnosisError>;
}
