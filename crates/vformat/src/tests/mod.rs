mod parse_bad;
mod parse_good;

use alloc::vec::Vec;

use crate::{Document, ObjectId, Property};

/// Whether both documents hold equal top-level objects in the same order.
pub(crate) fn same_documents(a: &Document, b: &Document) -> bool {
    let left: Vec<ObjectId> = a.roots().collect();
    let right: Vec<ObjectId> = b.roots().collect();
    left.len() == right.len() && left.iter().zip(&right).all(|(&x, &y)| a.object_eq(x, b, y))
}

/// The properties of `object`, in order.
pub(crate) fn properties(doc: &Document, object: ObjectId) -> Vec<&Property> {
    doc.object(object)
        .map(|o| o.properties().iter().filter_map(|&p| doc.property(p)).collect())
        .unwrap_or_default()
}

/// How many cases a quickcheck property runs.
pub(crate) fn quickcheck_tests() -> u64 {
    if cfg!(miri) {
        10
    } else if cfg!(feature = "test-fast") {
        100
    } else {
        1_000
    }
}
