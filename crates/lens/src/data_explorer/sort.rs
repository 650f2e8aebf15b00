//
// sort.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::cmp::Ordering;

use crate::value::Value;

/// Stable lexicographic sort of `rows`. Each key is a full column of
/// values indexed by row, paired with its direction. Missing values go
/// last whatever the direction.
pub fn sort_rows_by_values(rows: &mut [usize], keys: &[(Vec<Value>, bool)]) {
    rows.sort_by(|a, b| {
        for (values, ascending) in keys {
            let ordering = compare_missing_last(&values[*a], &values[*b], *ascending);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn compare_missing_last(x: &Value, y: &Value, ascending: bool) -> Ordering {
    match (x.is_missing(), y.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match ascending {
            true => x.sort_cmp(y),
            false => x.sort_cmp(y).reverse(),
        },
    }
}
