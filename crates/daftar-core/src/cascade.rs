//! # Rename Cascade
//!
//! Pushes a renamed item or party into the name snapshots of historical
//! documents.
//!
//! ```text
//!  rename_cascade(Item, id, "Widget", "Widget Pro")
//!
//!   SAL001  lines: [Widget ×2]  ──► [Widget Pro ×2]   touched
//!   SAL002  lines: [Bolt ×1]                          untouched
//!   PUR001  lines: [Widget ×9]  ──► [Widget Pro ×9]   touched
//!                                                     ─────────
//!                                                     returns 2
//! ```
//!
//! ## Matching
//! A reference matches when its id equals `id`, or, as a fallback for records
//! written before ids were stored, when its snapshot equals `old_name`
//! exactly. The fallback is a heuristic: two records that once shared a name
//! cannot be told apart by it.

use crate::types::{Document, DocumentKind, EntityType};

/// Rewrites snapshots referencing the renamed record and returns the number of
/// documents touched.
///
/// Item renames apply to lines of any document. Customer renames apply to
/// sales only, supplier renames to purchases only. Renaming to the same name
/// touches nothing.
pub fn rename_cascade<'a>(
    documents: impl IntoIterator<Item = &'a mut Document>,
    entity_type: EntityType,
    id: &str,
    old_name: &str,
    new_name: &str,
) -> usize {
    if old_name == new_name {
        return 0;
    }

    documents
        .into_iter()
        .map(|document| match entity_type {
            EntityType::Item => rename_lines(document, id, old_name, new_name),
            EntityType::Customer => {
                rename_party(document, DocumentKind::Sale, id, old_name, new_name)
            }
            EntityType::Supplier => {
                rename_party(document, DocumentKind::Purchase, id, old_name, new_name)
            }
        })
        .filter(|touched| *touched)
        .count()
}

fn rename_lines(document: &mut Document, id: &str, old_name: &str, new_name: &str) -> bool {
    let mut touched = false;
    for line in &mut document.lines {
        if line.item_id == id || line.name_snapshot == old_name {
            line.name_snapshot = new_name.to_string();
            touched = true;
        }
    }
    touched
}

fn rename_party(
    document: &mut Document,
    kind: DocumentKind,
    id: &str,
    old_name: &str,
    new_name: &str,
) -> bool {
    if document.kind != kind {
        return false;
    }
    if document.party_id == id || document.party_name_snapshot == old_name {
        document.party_name_snapshot = new_name.to_string();
        return true;
    }
    false
}
