//! Inline product rows for receiving and delivery cases.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{CaseRecord, LineItem};

/// Prefix marking ids generated on the client for rows that were never persisted.
pub const TEMP_ID_PREFIX: &str = "tmp-";

pub fn is_temporary_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

fn temporary_id() -> String {
    format!("{TEMP_ID_PREFIX}{}", uuid::Uuid::new_v4())
}

/// Editable fields of a line row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineField {
    Name,
    Code,
    Quantity,
    SerialNumber,
}

/// A row as typed into the form. Quantity stays text until submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDraft {
    pub id: String,
    pub name: String,
    pub code: String,
    pub quantity: String,
    pub serial_number: String,
}

/// Line row as sent with the case payload; `id` is omitted for rows created on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

/// Ordered, client-managed list of line rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductLineset {
    items: Vec<LineDraft>,
}

impl ProductLineset {
    pub fn from_items(items: &[LineItem]) -> Self {
        Self {
            items: items
                .iter()
                .map(|item| LineDraft {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    code: item.code.clone().unwrap_or_default(),
                    quantity: item.quantity.to_string(),
                    serial_number: item.serial_number.clone().unwrap_or_default(),
                })
                .collect(),
        }
    }

    pub fn items(&self) -> &[LineDraft] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a blank row with a temporary id and a quantity of 1; returns the new id.
    pub fn add(&mut self) -> String {
        let id = temporary_id();
        self.items.push(LineDraft {
            id: id.clone(),
            name: String::new(),
            code: String::new(),
            quantity: "1".to_string(),
            serial_number: String::new(),
        });
        id
    }

    /// Remove the row with `id`; unknown ids leave the list unchanged.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Set one field of the row with `id`; unknown ids leave the list unchanged.
    pub fn update(&mut self, id: &str, field: LineField, value: impl Into<String>) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };

        let value = value.into();
        match field {
            LineField::Name => item.name = value,
            LineField::Code => item.code = value,
            LineField::Quantity => item.quantity = value,
            LineField::SerialNumber => item.serial_number = value,
        }
        true
    }

    pub fn to_payload(&self) -> Vec<LineItemPayload> {
        self.items
            .iter()
            .map(|item| LineItemPayload {
                id: (!is_temporary_id(&item.id)).then(|| item.id.clone()),
                name: item.name.trim().to_string(),
                code: non_blank(&item.code),
                quantity: parse_quantity(&item.quantity),
                serial_number: non_blank(&item.serial_number),
            })
            .collect()
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse the leading digits of a typed quantity (`"12 pcs"` is 12, `"3.5"` is 3). Input
/// without a leading positive integer becomes 1.
pub fn parse_quantity(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let digits = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed, |end| &trimmed[..end]);
    digits
        .parse::<u32>()
        .ok()
        .filter(|quantity| *quantity >= 1)
        .unwrap_or(1)
}

/// Where the product rows shown for a case came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "content", rename_all = "snake_case")]
pub enum ResolvedLineItems {
    Structured(Vec<LineItem>),
    /// Older records stored the rows as a JSON array in `description`.
    LegacyDescription(Vec<LineItem>),
    Text(String),
    Empty,
}

impl ResolvedLineItems {
    pub fn items(&self) -> &[LineItem] {
        match self {
            ResolvedLineItems::Structured(items) | ResolvedLineItems::LegacyDescription(items) => {
                items
            }
            ResolvedLineItems::Text(_) | ResolvedLineItems::Empty => &[],
        }
    }
}

/// Structured rows first, then a JSON array in the description, then the description as text.
pub fn resolve_line_items(record: &CaseRecord) -> ResolvedLineItems {
    if !record.line_items.is_empty() {
        return ResolvedLineItems::Structured(record.line_items.clone());
    }

    let description = record.description.trim();
    if description.is_empty() {
        return ResolvedLineItems::Empty;
    }

    match parse_legacy_rows(description) {
        Some(items) => ResolvedLineItems::LegacyDescription(items),
        None => ResolvedLineItems::Text(description.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRow {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    quantity: Option<Value>,
    #[serde(default)]
    serial_number: Option<String>,
}

fn parse_legacy_rows(description: &str) -> Option<Vec<LineItem>> {
    let rows: Vec<LegacyRow> = serde_json::from_str(description).ok()?;
    Some(
        rows.into_iter()
            .enumerate()
            .map(|(index, row)| LineItem {
                id: match row.id {
                    Some(Value::String(id)) => id,
                    Some(Value::Number(id)) => id.to_string(),
                    _ => format!("legacy-{}", index + 1),
                },
                name: row.name,
                code: row.code.filter(|code| !code.trim().is_empty()),
                quantity: match row.quantity {
                    Some(Value::Number(number)) => number
                        .as_u64()
                        .and_then(|value| u32::try_from(value).ok())
                        .filter(|value| *value >= 1)
                        .unwrap_or(1),
                    Some(Value::String(text)) => parse_quantity(&text),
                    _ => 1,
                },
                serial_number: row.serial_number.filter(|serial| !serial.trim().is_empty()),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_lineset() -> (ProductLineset, String) {
        let mut lineset = ProductLineset::default();
        let id = lineset.add();
        lineset.update(&id, LineField::Name, "Pallet jack");
        (lineset, id)
    }

    #[test]
    fn add_appends_row_with_temporary_id_and_unit_quantity() {
        let mut lineset = ProductLineset::default();
        let first = lineset.add();
        let second = lineset.add();

        assert_eq!(lineset.len(), 2);
        assert!(is_temporary_id(&first));
        assert_ne!(first, second);
        assert_eq!(lineset.items()[1].id, second);
        assert_eq!(lineset.items()[0].quantity, "1");
    }

    #[test]
    fn update_and_remove_ignore_unknown_ids() {
        let (mut lineset, _) = filled_lineset();
        let before = lineset.clone();

        assert!(!lineset.update("missing", LineField::Quantity, "4"));
        assert!(!lineset.remove("missing"));
        assert_eq!(lineset, before);
    }

    #[test]
    fn payload_parses_quantities_with_fallback() {
        let (mut lineset, id) = filled_lineset();
        let other = lineset.add();
        lineset.update(&id, LineField::Quantity, " 12 ");
        lineset.update(&other, LineField::Quantity, "twelve");
        lineset.update(&other, LineField::SerialNumber, "  ");

        let payload = lineset.to_payload();
        assert_eq!(payload[0].quantity, 12);
        assert_eq!(payload[0].name, "Pallet jack");
        assert_eq!(payload[1].quantity, 1);
        assert!(payload[1].serial_number.is_none());
        assert!(payload.iter().all(|row| row.id.is_none()));
    }

    #[test]
    fn persisted_rows_keep_their_ids_in_the_payload() {
        let lineset = ProductLineset::from_items(&[LineItem {
            id: "li-7".to_string(),
            name: "Scanner".to_string(),
            code: Some("SC-1".to_string()),
            quantity: 3,
            serial_number: None,
        }]);

        let payload = lineset.to_payload();
        assert_eq!(payload[0].id.as_deref(), Some("li-7"));
        assert_eq!(payload[0].quantity, 3);
    }

    #[test]
    fn zero_and_negative_quantities_fall_back_to_one() {
        assert_eq!(parse_quantity("0"), 1);
        assert_eq!(parse_quantity("-3"), 1);
        assert_eq!(parse_quantity(""), 1);
        assert_eq!(parse_quantity("7"), 7);
    }

    #[test]
    fn quantities_keep_their_leading_digits() {
        assert_eq!(parse_quantity("3.5"), 3);
        assert_eq!(parse_quantity(" 12 pcs"), 12);
        assert_eq!(parse_quantity("pcs 12"), 1);
        assert_eq!(parse_quantity("0.9"), 1);
    }

    #[test]
    fn legacy_rows_accept_numeric_and_text_quantities() {
        let rows = parse_legacy_rows(
            r#"[{"name":"Cable","quantity":"3"},{"id":9,"name":"Switch","quantity":2,"serialNumber":"SW-1"}]"#,
        )
        .expect("legacy rows parse");

        assert_eq!(rows[0].id, "legacy-1");
        assert_eq!(rows[0].quantity, 3);
        assert_eq!(rows[1].id, "9");
        assert_eq!(rows[1].serial_number.as_deref(), Some("SW-1"));
        assert!(parse_legacy_rows("Two boxes of cables").is_none());
        assert!(parse_legacy_rows(r#"{"name":"not an array"}"#).is_none());
    }
}
