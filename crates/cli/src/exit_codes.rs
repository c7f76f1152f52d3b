//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Description                                         |
//! |------|-----------------------------------------------------|
//! | 0    | Success                                             |
//! | 1    | General error (unspecified)                         |
//! | 2    | Usage error (bad args, missing file, bad policy)    |
//! | 3    | Unsupported document format                         |
//! | 4    | Document parse or value extraction error            |
//! | 5    | Mismatch found (difference outside tolerance, or    |
//! |      | expected tags absent from the document)             |
//! | 6    | Unknown tag or account                              |

use closetrack_engine::ExtractError;
use closetrack_io::GridError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options, invalid policy.
pub const EXIT_USAGE: u8 = 2;

/// Document format not accepted (extension is not xlsx/xls/csv/tsv/txt).
pub const EXIT_UNSUPPORTED_FORMAT: u8 = 3;

/// Document failed to parse, or a tag's value could not be extracted.
pub const EXIT_EXTRACTION: u8 = 4;

/// Validation created but the difference is outside tolerance, or
/// registered tags were absent from the document.
pub const EXIT_MISMATCH: u8 = 5;

/// Tag or account not registered.
pub const EXIT_UNKNOWN: u8 = 6;

/// Map an engine error to its exit code.
pub fn extract_exit_code(err: &ExtractError) -> u8 {
    match err {
        ExtractError::TagNotFound(_)
        | ExtractError::ValueExtraction { .. }
        | ExtractError::AmountRequired { .. } => EXIT_EXTRACTION,
        ExtractError::DuplicateTag(_)
        | ExtractError::UnknownAccount(_)
        | ExtractError::UnknownTask(_)
        | ExtractError::InvalidAccountNumber(_) => EXIT_UNKNOWN,
        ExtractError::PolicyParse(_) | ExtractError::PolicyValidation(_) => EXIT_USAGE,
        ExtractError::Store(_) => EXIT_ERROR,
    }
}

/// Map a document-loading error to its exit code.
pub fn grid_exit_code(err: &GridError) -> u8 {
    match err {
        GridError::UnsupportedFormat(_) => EXIT_UNSUPPORTED_FORMAT,
        GridError::Parse(_) => EXIT_EXTRACTION,
    }
}
