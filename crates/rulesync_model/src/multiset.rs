//! Multiset algebra over element lists.
//!
//! Remote lists are unordered multisets with no element identity. All
//! operations here match by [`StructuralEq`] and never reorder the
//! elements they keep.

use crate::equality::StructuralEq;

/// Returns true if `items` holds an element structurally equal to `item`.
pub fn contains<T: StructuralEq>(items: &[T], item: &T) -> bool {
    items.iter().any(|candidate| candidate.structurally_eq(item))
}

/// Collapses structural duplicates. The first occurrence wins.
pub fn dedup<T: StructuralEq + Clone>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !contains(&out, item) {
            out.push(item.clone());
        }
    }
    out
}

/// Appends every element of `desired` that `remote` does not already hold.
///
/// Duplicates already present in `remote` are left alone; they may have
/// been contributed by other units. Returns the number of elements added.
pub fn union_into<T: StructuralEq + Clone>(remote: &mut Vec<T>, desired: &[T]) -> usize {
    let mut added = 0;
    for item in desired {
        if !contains(remote, item) {
            remote.push(item.clone());
            added += 1;
        }
    }
    added
}

/// Removes at most one matching occurrence from `remote` for each element
/// of `to_remove`. Returns the number of elements removed.
///
/// Structurally identical elements contributed by different units are
/// indistinguishable, so a removal may take another unit's copy.
pub fn remove_each<T: StructuralEq>(remote: &mut Vec<T>, to_remove: &[T]) -> usize {
    let mut removed = 0;
    for item in to_remove {
        if let Some(pos) = remote.iter().position(|r| r.structurally_eq(item)) {
            remote.remove(pos);
            removed += 1;
        }
    }
    removed
}

/// Elements of `a` with no structural match in `b`.
pub fn difference<T: StructuralEq + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    a.iter().filter(|x| !contains(b, x)).cloned().collect()
}

/// Elements of `a` with a structural match in `b`.
pub fn intersection<T: StructuralEq + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    a.iter().filter(|x| contains(b, x)).cloned().collect()
}

/// Multiset equality, ignoring order.
pub fn set_eq<T: StructuralEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    for x in a {
        match b
            .iter()
            .enumerate()
            .position(|(i, y)| !used[i] && x.structurally_eq(y))
        {
            Some(i) => used[i] = true,
            None => return false,
        }
    }
    true
}
