use thiserror::Error;
use tracing::warn;

/// Failures that end processing of one translation.
#[derive(Debug, Error)]
pub enum ScmlError {
    #[error("malformed markup at byte {position}: {message}")]
    MalformedMarkup { position: u64, message: String },
    #[error("resource {resource:?} references missing image {image:?}")]
    MissingImage { resource: String, image: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Recoverable problems. Each one is logged when raised and kept for the
/// end-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("unparseable reference {text:?}")]
    UnparseableReference { text: String },
    #[error("unknown book {token:?} in reference {text:?}")]
    UnknownBook { token: String, text: String },
    #[error("note id {id:?} has no verse digits, skipped")]
    MissingIdentifierDigits { id: String },
    #[error("note id {id:?} has more verse digits than fit a verse number, skipped")]
    IdentifierOutOfRange { id: String },
    #[error("note {id:?} has no content, skipped")]
    EmptyNote { id: String },
    #[error("duplicate resource id {id:?}, content merged")]
    DuplicateResource { id: String },
    #[error("image {image:?} for resource {resource:?} not found, instance dropped")]
    MissingImage { resource: String, image: String },
    #[error("text near byte {position} could not be unescaped, kept raw")]
    UndecodableText { position: u64 },
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
