use std::borrow::Cow;

use crate::products::repo::Product;

const HEADER: &str = "Name,Description,Price";

/// Serialize the full product catalog as CSV, built in memory so concurrent
/// exports never share state.
pub fn products_csv(products: &[Product]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for p in products {
        out.push_str(&field(&p.name));
        out.push(',');
        out.push_str(&field(p.description.as_deref().unwrap_or("")));
        out.push(',');
        if let Some(price) = p.price {
            out.push_str(&price.to_string());
        }
        out.push('\n');
    }
    out
}

/// RFC 4180 quoting: a field containing a comma, quote, or line break is
/// wrapped in quotes with embedded quotes doubled.
fn field(value: &str) -> Cow<'_, str> {
    if !value.contains(['"', ',', '\n', '\r']) {
        return Cow::Borrowed(value);
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' {
            quoted.push('"');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn product(name: &str, description: Option<&str>, price: Option<f64>) -> Product {
        Product {
            id: 1,
            name: name.to_string(),
            description: description.map(str::to_string),
            price,
            user_id: 1,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    /// Minimal RFC 4180 reader used to check that a standard parse of the
    /// export recovers the stored values.
    fn parse_csv(input: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();
        while let Some(c) = chars.next() {
            if in_quotes {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        current.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    current.push(c);
                }
            } else {
                match c {
                    '"' => in_quotes = true,
                    ',' => row.push(std::mem::take(&mut current)),
                    '\n' => {
                        row.push(std::mem::take(&mut current));
                        rows.push(std::mem::take(&mut row));
                    }
                    '\r' => {}
                    _ => current.push(c),
                }
            }
        }
        if !current.is_empty() || !row.is_empty() {
            row.push(current);
            rows.push(row);
        }
        rows
    }

    #[test]
    fn empty_catalog_is_header_only() {
        assert_eq!(products_csv(&[]), "Name,Description,Price\n");
    }

    #[test]
    fn one_row_per_product() {
        let csv = products_csv(&[
            product("chair", Some("oak"), Some(40.0)),
            product("desk", None, None),
        ]);
        let rows = parse_csv(&csv);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Name", "Description", "Price"]);
        assert_eq!(rows[1], vec!["chair", "oak", "40"]);
        assert_eq!(rows[2], vec!["desk", "", ""]);
    }

    #[test]
    fn embedded_comma_survives_round_trip() {
        let csv = products_csv(&[product("chair, oak", Some("seat, wide"), Some(9.5))]);
        let rows = parse_csv(&csv);
        assert_eq!(rows[1], vec!["chair, oak", "seat, wide", "9.5"]);
    }

    #[test]
    fn embedded_quote_and_newline_survive_round_trip() {
        let csv = products_csv(&[product("the \"best\" chair", Some("line one\nline two"), None)]);
        let rows = parse_csv(&csv);
        assert_eq!(rows[1][0], "the \"best\" chair");
        assert_eq!(rows[1][1], "line one\nline two");
    }

    #[test]
    fn plain_fields_are_not_quoted() {
        let csv = products_csv(&[product("chair", Some("oak"), None)]);
        assert_eq!(csv, "Name,Description,Price\nchair,oak,\n");
    }
}
