//! Rendering of command results on stdout.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
}

/// Renders `value` in the requested format, without a trailing newline.
pub fn render<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(text.trim_end_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_json_and_yaml_preserving_key_order() {
        let value = json!({"data": {"user": {"name": "Ada", "id": "42"}}});

        assert_eq!(
            render(&value, OutputFormat::Json).unwrap(),
            "{\n  \"data\": {\n    \"user\": {\n      \"name\": \"Ada\",\n      \"id\": \"42\"\n    }\n  }\n}"
        );
        assert_eq!(
            render(&value, OutputFormat::Yaml).unwrap(),
            "data:\n  user:\n    name: Ada\n    id: '42'"
        );
    }
}
