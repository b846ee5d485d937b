use std::cmp::Ordering;

use crate::models::ReorderRow;

/// Urgency order: fewest days of supply first, SKUs without demand last,
/// larger order quantities first among equals.
pub fn compare_urgency(a: &ReorderRow, b: &ReorderRow) -> Ordering {
    let by_supply = match (a.days_of_supply, b.days_of_supply) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_supply.then_with(|| b.order_qty.cmp(&a.order_qty))
}

/// Sorts rows most urgent first. Stable, so fully tied rows keep their
/// input order.
pub fn rank(rows: &mut [ReorderRow]) {
    rows.sort_by(compare_urgency);
}
