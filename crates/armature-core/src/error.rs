use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Duplicate target id in input: {0}")]
    DuplicateTarget(String),

    #[error("Invalid build label: {0}")]
    InvalidLabel(String),

    #[error("Path cannot be classified: {0}")]
    UnclassifiablePath(String),
}
