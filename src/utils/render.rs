//! Presentation of lookup results for the command line.

use crate::domain::model::ServiceResult;
use crate::utils::error::{Result, ZipCodeError};
use serde_json::{json, Value};

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn render_json(result: &ServiceResult) -> Result<String> {
    let document = json!({
        "web_service": result.source_service_name(),
        "empty": result.is_empty(),
        "fields": result.fields(),
        "errors": result.errors(),
    });
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Header row of field names, then one row of values.
pub fn render_csv(result: &ServiceResult) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(result.fields().keys())?;
    writer.write_record(result.fields().values().map(display_value))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| ZipCodeError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn render_text(result: &ServiceResult) -> String {
    let mut lines = Vec::new();

    match result.source_service_name() {
        Some(name) => lines.push(format!("web service: {}", name)),
        None => lines.push("no web service was queried".to_string()),
    }

    let width = result.fields().keys().map(String::len).max().unwrap_or(0);
    for (field, value) in result.fields() {
        lines.push(format!("{:width$}  {}", field, display_value(value), width = width));
    }

    for error in result.errors() {
        lines.push(format!("warning: {}", error));
    }

    let missing = result.missing_mandatory_fields();
    if !missing.is_empty() {
        lines.push(format!("missing mandatory fields: {}", missing.join(", ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn sample() -> ServiceResult {
        let mut fields = IndexMap::new();
        fields.insert("zip".to_string(), json!("20250030"));
        fields.insert("city".to_string(), json!("Rio de Janeiro, RJ"));
        fields.insert("latitude".to_string(), json!(-22.91));
        ServiceResult::new(
            fields,
            vec!["Result field 'missing_field' was not found.".to_string()],
            "ViaCep",
            vec!["city".to_string()],
        )
    }

    #[test]
    fn test_render_csv_quotes_values() {
        let csv = render_csv(&sample()).unwrap();
        assert_eq!(csv, "zip,city,latitude\n20250030,\"Rio de Janeiro, RJ\",-22.91\n");
    }

    #[test]
    fn test_render_json() {
        let rendered = render_json(&sample()).unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["web_service"], json!("ViaCep"));
        assert_eq!(value["empty"], json!(false));
        assert_eq!(value["fields"]["zip"], json!("20250030"));
        assert_eq!(value["errors"][0], json!("Result field 'missing_field' was not found."));
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample());
        assert!(text.starts_with("web service: ViaCep"));
        assert!(text.contains("city      Rio de Janeiro, RJ"));
        assert!(text.contains("warning: Result field 'missing_field' was not found."));

        let empty = render_text(&ServiceResult::empty());
        assert_eq!(empty, "no web service was queried");
    }
}
