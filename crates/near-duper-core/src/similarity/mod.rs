pub mod table;
pub mod text;

use crate::error::ExtractionError;
use crate::model::{FileRepresentation, RepresentationKind, SimilarityResult};

pub use table::{sheet_similarity, table_similarity};
pub use text::text_similarity;

/// Score two extracted files under the threshold of `kind`.
///
/// A failed extraction on either side, or a representation of the wrong
/// kind, scores 0.0 and is never similar.
pub fn score(
    kind: RepresentationKind,
    a: Result<&FileRepresentation, &ExtractionError>,
    b: Result<&FileRepresentation, &ExtractionError>,
) -> SimilarityResult {
    let (Ok(a), Ok(b)) = (a, b) else {
        return SimilarityResult::not_similar();
    };

    let raw = match (kind, a, b) {
        (RepresentationKind::Text, FileRepresentation::Text(a), FileRepresentation::Text(b)) => {
            text_similarity(a, b)
        }
        (RepresentationKind::Table, FileRepresentation::Table(a), FileRepresentation::Table(b)) => {
            table_similarity(a, b)
        }
        _ => return SimilarityResult::not_similar(),
    };

    SimilarityResult::from_score(kind, raw)
}
