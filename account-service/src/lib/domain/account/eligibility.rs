use std::collections::HashSet;

use crate::account::models::Document;

/// Document names an account must have uploaded before it can be upgraded.
///
/// Matching is exact: case- and accent-sensitive.
pub const REQUIRED_DOCUMENTS: [&str; 3] = [
    "Identificación",
    "Comprobante de domicilio",
    "Comprobante de estado de cuenta",
];

/// Required-document names absent from the account's uploads.
///
/// Set containment over distinct names: duplicates and extra names are
/// ignored, upload order is irrelevant. Empty result means eligible.
pub fn missing_documents(documents: &[Document]) -> Vec<&'static str> {
    let uploaded: HashSet<&str> = documents.iter().map(|d| d.name.as_str()).collect();

    REQUIRED_DOCUMENTS
        .iter()
        .filter(|required| !uploaded.contains(**required))
        .copied()
        .collect()
}

/// Whether the account's document set satisfies every required name.
pub fn is_eligible(documents: &[Document]) -> bool {
    missing_documents(documents).is_empty()
}
