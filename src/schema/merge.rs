//! Field-table merge for record inheritance
//!
//! Ancestors are linearized with C3, the same order method lookup uses. A
//! field name belongs to the first ancestor in that order that declares it
//! itself; it keeps the position where it was first seen. The child's own
//! fields then override inherited ones in place or are appended.

use std::sync::Arc;

use super::types::{FieldTable, RecordSchema};
use crate::field::{FieldDescriptor, FieldOrigin};

/// Merges parent tables with the child's own fields.
///
/// `ancestors` is the linearization from [`merge_ancestors`].
pub fn merge_fields(parents: &[Arc<RecordSchema>], ancestors: &[String], own: Vec<FieldDescriptor>) -> FieldTable {
    let rank = |name: &str| ancestors.iter().position(|a| a == name).unwrap_or(usize::MAX);
    let mut table = FieldTable::new();

    for parent in parents {
        for (name, field) in parent.field_table() {
            let owner = declaring_ancestor(field, parent.type_name());
            let replace = match table.get(name) {
                None => true,
                Some(current) => rank(owner) < rank(declaring_ancestor(current, owner)),
            };
            if !replace {
                continue;
            }
            let mut inherited = field.clone();
            inherited.origin = FieldOrigin::Inherited {
                ancestor: owner.to_string(),
            };
            // IndexMap::insert keeps the position of an existing key
            table.insert(name.clone(), inherited);
        }
    }

    for mut field in own {
        field.origin = FieldOrigin::Declared;
        table.insert(field.name.clone(), field);
    }

    table
}

fn declaring_ancestor<'a>(field: &'a FieldDescriptor, holder: &'a str) -> &'a str {
    match &field.origin {
        FieldOrigin::Inherited { ancestor } => ancestor,
        FieldOrigin::Declared | FieldOrigin::Dynamic => holder,
    }
}

/// C3 linearization of the parents and their ancestors.
///
/// Returns `None` when the parents admit no consistent order, for example a
/// parent listed twice or listed before one of its own descendants.
pub fn merge_ancestors(parents: &[Arc<RecordSchema>]) -> Option<Vec<String>> {
    let mut sequences: Vec<Vec<String>> = parents
        .iter()
        .map(|p| {
            std::iter::once(p.type_name().to_string())
                .chain(p.ancestors().iter().cloned())
                .collect()
        })
        .collect();
    sequences.push(parents.iter().map(|p| p.type_name().to_string()).collect());

    let mut order = Vec::new();
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            return Some(order);
        }
        let head = sequences
            .iter()
            .map(|s| &s[0])
            .find(|head| sequences.iter().all(|s| !s[1..].contains(head)))?
            .clone();
        for sequence in &mut sequences {
            if sequence.first() == Some(&head) {
                sequence.remove(0);
            }
        }
        order.push(head);
    }
}
