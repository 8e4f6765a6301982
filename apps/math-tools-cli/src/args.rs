use math_tools_sdk::ArgValue;

/// Parse a `name=value` pair from the command line.
///
/// Values that are JSON scalars or arrays (`12`, `true`, `[1, 2]`) keep their
/// type; anything else is passed on as text and parsed during validation.
pub fn parse_pair(raw: &str) -> Result<(String, ArgValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{raw}'"));
    }

    let value = serde_json::from_str::<ArgValue>(value.trim())
        .unwrap_or_else(|_| ArgValue::Text(value.to_owned()));
    Ok((name.to_owned(), value))
}
