use serde::{Deserialize, Deserializer};

/// Form body for creating or updating a product. Browsers submit every
/// field, so an untouched price arrives as an empty string rather than a
/// missing key.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub price: Option<f64>,
}

/// Form body for the authenticated search page.
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    pub search_term: String,
}

/// Query string for the public product list.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: String,
}

fn empty_string_as_none<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<f64>().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_price_becomes_none() {
        let form: ProductForm =
            serde_json::from_str(r#"{"name":"chair","description":"","price":""}"#).unwrap();
        assert_eq!(form.price, None);
        assert_eq!(form.description.as_deref(), Some(""));
    }

    #[test]
    fn numeric_price_is_parsed() {
        let form: ProductForm =
            serde_json::from_str(r#"{"name":"chair","description":"oak","price":"12.50"}"#)
                .unwrap();
        assert_eq!(form.price, Some(12.5));
    }

    #[test]
    fn garbage_price_is_rejected() {
        let result =
            serde_json::from_str::<ProductForm>(r#"{"name":"chair","price":"cheap"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn missing_optional_fields_default() {
        let form: ProductForm = serde_json::from_str(r#"{"name":"chair"}"#).unwrap();
        assert_eq!(form.description, None);
        assert_eq!(form.price, None);
    }

    #[test]
    fn list_query_defaults_to_empty_search() {
        let q: ListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.search, "");
    }
}
