//! Set command - write one property

use anyhow::Result;
use clap::Args;
use entity_tree::transport::FixedAnswer;
use serde_json::Value;
use std::sync::Arc;

use crate::cli::{CliContext, OutputFormatter};

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Entity id
    id: String,

    /// Property key
    key: String,

    /// New value; parsed as JSON when possible, otherwise sent as a string
    value: String,
}

/// `42` stays a number, `true` a boolean, `"x"` and `x` both become "x"
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub async fn execute(ctx: &CliContext, args: SetArgs) -> Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let session = ctx.session(Arc::new(FixedAnswer(false)))?;
    let value = parse_value(&args.value);

    session.set_property(&args.id, &args.key, &value).await?;
    formatter.success(&format!("Set {}.{} = {}", args.id, args.key, value));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_parse_as_json_first() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("\"x\""), json!("x"));
        assert_eq!(parse_value("plain text"), json!("plain text"));
        assert_eq!(parse_value("null"), Value::Null);
    }
}
