pub mod books;
pub mod error;
pub mod extract;
pub mod inline;
pub mod refs;
pub mod stream;
pub mod tree;

use std::io::BufRead;

use error::{Diagnostics, ScmlError};
use extract::ExtractContext;
use stream::{Driver, Extraction};

/// One streaming pass: SCML events → closed elements → notes and resources.
pub fn extract_translation<R: BufRead>(
    source: R,
    ctx: &ExtractContext,
    diag: &mut Diagnostics,
) -> Result<Extraction, ScmlError> {
    Driver::new(ctx).run(source, diag)
}
