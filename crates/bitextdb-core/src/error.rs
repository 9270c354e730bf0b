//! Error types for `bitextdb-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An `alignType` tag that is not of the `"m-n"` form.
  #[error("invalid align type: {0:?}")]
  InvalidAlignType(String),

  /// A stored sentence-ID group token that is not an integer.
  #[error("invalid sentence id: {0:?}")]
  InvalidSentenceId(String),

  /// A language-pair code that is not of the `"xx-yy"` form.
  #[error("invalid language pair: {0:?}")]
  InvalidLangPair(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
