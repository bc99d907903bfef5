use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimilarityError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input syntax for type {type_name}: \"{input}\"")]
    InvalidSyntax {
        type_name: &'static str,
        input: String,
    },

    #[error("Index key of {0} bytes is neither one nor two signatures")]
    InvalidKeySize(usize),

    #[error("Pattern buffer of {0} bytes has the wrong size")]
    InvalidPatternSize(usize),

    #[error("Signature buffer of {0} bytes has the wrong size")]
    InvalidSignatureSize(usize),

    #[error("Union over an empty key set")]
    EmptyUnion,

    #[error("Cannot split {0} entries into two groups")]
    SplitTooSmall(usize),
}

pub type Result<T> = std::result::Result<T, SimilarityError>;
