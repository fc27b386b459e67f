//! Argument helpers shared by the pixlift binaries.

use anyhow::{bail, Context};
use pixlift_core::{FieldValue, FormFields};

/// Split `name=value`. The value may itself contain `=`.
pub fn parse_key_value(input: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = input
        .split_once('=')
        .with_context(|| format!("expected NAME=VALUE, got {input:?}"))?;
    if name.is_empty() {
        bail!("empty name in {input:?}");
    }
    Ok((name.to_string(), value.to_string()))
}

/// Build form fields from `name=value` pairs. A repeated name becomes a list
/// at the position of its first occurrence.
pub fn collect_fields(pairs: &[(String, String)]) -> FormFields {
    let mut fields = FormFields::new();
    for (name, value) in pairs {
        let merged = match fields.get(name) {
            None => FieldValue::Text(value.clone()),
            Some(existing) => {
                let mut values: Vec<String> = existing.values().map(str::to_string).collect();
                values.push(value.clone());
                FieldValue::List(values)
            }
        };
        fields.insert(name.clone(), merged);
    }
    fields
}
