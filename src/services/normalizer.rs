//! Maps loosely-shaped POSaBIT sale events onto canonical line items.
//!
//! The sender does not commit to a schema, so every logical field is read
//! through an ordered list of candidate paths. The first candidate that is
//! present and not `null` wins, regardless of where it sits in the object.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

use crate::models::{NormalizedLine, NormalizedSale, SaleEvent};

type FieldPath = &'static [&'static str];

const SALE_ID_FIELDS: &[FieldPath] = &[&["sale", "id"], &["sale_id"], &["id"]];
const LINE_ITEM_FIELDS: &[FieldPath] = &[&["sale", "line_items"], &["items"], &["line_items"]];
const SKU_FIELDS: &[FieldPath] = &[&["product", "sku"], &["sku"], &["SKU"], &["product_sku"]];
const QTY_FIELDS: &[FieldPath] = &[&["quantity"], &["qty"]];
const NAME_FIELDS: &[FieldPath] = &[&["product", "name"], &["name"]];
const VENDOR_FIELDS: &[FieldPath] = &[&["product", "brand"], &["product", "vendor"]];

/// Nested lookup. Missing keys, non-object parents and JSON `null` all read
/// as absent.
fn field<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    (!current.is_null()).then_some(current)
}

fn first_present<'a>(value: &'a Value, candidates: &[FieldPath]) -> Option<&'a Value> {
    candidates.iter().find_map(|path| field(value, path))
}

/// Scalar as text; objects, arrays and booleans are not usable identifiers.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    value.and_then(text).filter(|s| !s.is_empty())
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Decimal view of a float that does not fit a decimal exactly. Magnitudes
/// past the decimal range saturate to `Decimal::MAX`/`MIN`; values below its
/// smallest step (28 fractional digits) resolve to zero.
fn saturating_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    let saturated = if value.abs() < 1.0 {
        Decimal::ZERO
    } else if value > 0.0 {
        Decimal::MAX
    } else {
        Decimal::MIN
    };
    Some(Decimal::from_f64(value).unwrap_or(saturated))
}

fn numeric(raw: &str, fallback: Option<f64>) -> Decimal {
    parse_decimal(raw)
        .or_else(|| fallback.and_then(saturating_decimal))
        .unwrap_or(Decimal::ZERO)
}

/// Numeric coercion for quantities. Anything that is not a number, a numeric
/// string or a boolean becomes zero, which rejects the line.
fn quantity(value: Option<&Value>) -> Decimal {
    match value {
        Some(Value::Number(n)) => numeric(&n.to_string(), n.as_f64()),
        Some(Value::String(s)) => {
            let raw = s.trim();
            numeric(raw, raw.parse::<f64>().ok())
        }
        Some(Value::Bool(true)) => Decimal::ONE,
        _ => Decimal::ZERO,
    }
}

/// Sale identifier, `""` when the event carries none.
pub fn sale_id(event: &Value) -> String {
    first_present(event, SALE_ID_FIELDS)
        .and_then(text)
        .unwrap_or_default()
}

/// The event's line items. A candidate that is present but not an array
/// yields no items rather than falling through to the next candidate.
pub fn line_items(event: &Value) -> &[Value] {
    first_present(event, LINE_ITEM_FIELDS)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Maps one line item, or `None` when it has no usable SKU or a
/// non-positive quantity.
pub fn normalize_line(item: &Value) -> Option<NormalizedLine> {
    let sku = non_empty_text(first_present(item, SKU_FIELDS))?;
    let qty = quantity(first_present(item, QTY_FIELDS));
    if qty <= Decimal::ZERO {
        return None;
    }

    Some(NormalizedLine {
        sku,
        qty,
        name: non_empty_text(first_present(item, NAME_FIELDS)),
        vendor: non_empty_text(first_present(item, VENDOR_FIELDS)),
    })
}

/// Normalizes a parsed event. Never fails: malformed input produces fewer
/// (possibly zero) lines.
pub fn normalize_event(event: &Value) -> NormalizedSale {
    let sale_id = sale_id(event);
    let items = line_items(event);

    let mut lines = Vec::with_capacity(items.len());
    let mut rejected = 0;
    for (index, item) in items.iter().enumerate() {
        match normalize_line(item) {
            Some(line) => lines.push(line),
            None => {
                debug!(sale_id = %sale_id, index, "dropping line item without usable sku/qty");
                rejected += 1;
            }
        }
    }

    NormalizedSale {
        sale_id,
        lines,
        rejected,
    }
}

/// Normalizes a webhook body; raw (non-JSON) bodies yield nothing.
pub fn normalize(event: &SaleEvent) -> NormalizedSale {
    match event {
        SaleEvent::Structured(value) => normalize_event(value),
        SaleEvent::Raw(_) => NormalizedSale::default(),
    }
}
