use crate::{error::TemplateError, partition::{Granularity, PartitionKey}};

/// Placeholder names recognised in URL and table templates.
pub const PLACEHOLDERS: &[&str] = &["dataset", "year", "month", "day", "key", "compact"];

/// Names of the placeholders in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Result<Vec<&str>, TemplateError> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| TemplateError::Unterminated(template.to_string()))?;
        let name = &after[..close];
        if !PLACEHOLDERS.contains(&name) {
            return Err(TemplateError::UnknownPlaceholder(name.to_string()));
        }
        found.push(name);
        rest = &after[close + 1..];
    }
    Ok(found)
}

/// Whether the template varies with the partition key.
pub fn has_date_placeholder(template: &str) -> bool {
    placeholders(template)
        .map(|names| names.iter().any(|n| *n != "dataset"))
        .unwrap_or(false)
}

/// Fill `template` for one dataset and partition.
pub fn render(template: &str, dataset: &str, key: &PartitionKey) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| TemplateError::Unterminated(template.to_string()))?;
        let name = &after[..close];
        out.push_str(&substitute(name, dataset, key)?);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn substitute(name: &str, dataset: &str, key: &PartitionKey) -> Result<String, TemplateError> {
    let needs = |needed: &'static str| TemplateError::GranularityMismatch {
        placeholder: name.to_string(),
        needed,
    };
    let value = match name {
        "dataset" => dataset.to_string(),
        "year" => format!("{:04}", key.year()),
        "month" => {
            if key.granularity() == Granularity::Yearly {
                return Err(needs("monthly or daily"));
            }
            format!("{:02}", key.month())
        }
        "day" => {
            if key.granularity() != Granularity::Daily {
                return Err(needs("daily"));
            }
            format!("{:02}", key.day())
        }
        "key" => key.to_string(),
        "compact" => key.compact(),
        other => return Err(TemplateError::UnknownPlaceholder(other.to_string())),
    };
    Ok(value)
}
