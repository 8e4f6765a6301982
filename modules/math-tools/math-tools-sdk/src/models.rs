//! Public models for the math tools dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;

/// Operation group; also the path prefix under the grouped route style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Math,
    Algorithms,
}

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Algorithms => "algorithms",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of an operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Number,
    Integer,
    Sequence,
    Boolean,
}

impl ParamType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Sequence => "sequence of numbers",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared shape of an operation's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Number,
    Sequence,
    Boolean,
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Number => "number",
            Self::Sequence => "sequence of numbers",
            Self::Boolean => "boolean",
        })
    }
}

/// Value constraint checked locally before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Strictly greater than zero
    Positive,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => f.write_str("must be greater than 0"),
        }
    }
}

/// Default applied when an optional parameter is omitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Boolean(bool),
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn no_aliases(aliases: &&'static [&'static str]) -> bool {
    aliases.is_empty()
}

/// Schema of a single operation parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(skip_serializing_if = "no_aliases")]
    pub aliases: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
}

impl ParameterSpec {
    /// Whether `key` names this parameter, either directly or through an alias.
    #[must_use]
    pub fn answers_to(&self, key: &str) -> bool {
        self.name == key || self.aliases.contains(&key)
    }
}

/// Schema of a remote operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationSpec {
    pub name: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub parameters: &'static [ParameterSpec],
    pub result: ResultType,
}

impl OperationSpec {
    /// Look up a declared parameter by canonical name or alias.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&'static ParameterSpec> {
        self.parameters.iter().find(|p| p.answers_to(key))
    }
}

/// Loosely typed argument value as received from a caller.
///
/// `Text` carries strings from service data or intent slots; it is parsed
/// against the parameter type during validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Boolean(bool),
    Number(f64),
    Sequence(Vec<f64>),
    Text(String),
}

impl ArgValue {
    /// Short type label used in validation messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::Sequence(_) => "sequence",
            Self::Text(_) => "text",
        }
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Vec<f64>> for ArgValue {
    fn from(value: Vec<f64>) -> Self {
        Self::Sequence(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Caller-supplied arguments keyed by parameter name (or alias).
pub type Arguments = BTreeMap<String, ArgValue>;

/// Build an [`Arguments`] map from `(name, value)` pairs.
#[must_use]
pub fn arguments<K, V, I>(pairs: I) -> Arguments
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<ArgValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// An operation name plus caller-supplied arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    pub operation: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl CallRequest {
    #[must_use]
    pub fn new(operation: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            operation: operation.into(),
            arguments,
        }
    }
}

/// Result of a successful remote operation.
///
/// Numbers are kept exactly as the server sent them, so integer answers above
/// 2^53 (long Fibonacci runs, large factors) survive the round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationResult {
    Boolean(bool),
    Number(Number),
    Sequence(Vec<Number>),
}

impl OperationResult {
    #[must_use]
    pub fn result_type(&self) -> ResultType {
        match self {
            Self::Boolean(_) => ResultType::Boolean,
            Self::Number(_) => ResultType::Number,
            Self::Sequence(_) => ResultType::Sequence,
        }
    }

    /// The scalar as `f64`; lossy for integers above 2^53.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Number]> {
        match self {
            Self::Sequence(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_exact(n)),
            Self::Sequence(values) => {
                let items: Vec<String> = values.iter().map(format_exact).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/// Format a number without a trailing `.0` for integral values.
#[must_use]
pub fn format_number(value: f64) -> String {
    // 2^53: beyond this every f64 is integral and `{}` already omits the fraction
    const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < EXACT_INTEGER_LIMIT {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Format a JSON number: integers digit for digit, floats as [`format_number`].
#[must_use]
pub fn format_exact(value: &Number) -> String {
    if value.is_f64() {
        value.as_f64().map_or_else(|| value.to_string(), format_number)
    } else {
        value.to_string()
    }
}

/// Format a sequence as `[a, b, c]`.
#[must_use]
pub fn format_sequence(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| format_number(*v)).collect();
    format!("[{}]", items.join(", "))
}

/// Intent invocation: an intent type plus its slot values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRequest {
    pub intent_type: String,
    #[serde(default)]
    pub slots: Arguments,
}

impl IntentRequest {
    #[must_use]
    pub fn new(intent_type: impl Into<String>, slots: Arguments) -> Self {
        Self {
            intent_type: intent_type.into(),
            slots,
        }
    }
}

/// Card shown alongside an intent's spoken answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentCard {
    pub title: String,
    pub content: String,
}

/// Rendered answer to an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResponse {
    pub intent_type: String,
    pub operation: String,
    pub result: OperationResult,
    pub speech: String,
    pub card: IntentCard,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arg_value_deserializes_from_plain_json() {
        let args: Arguments = serde_json::from_value(json!({
            "a": 12,
            "flag": true,
            "values": [1, 2.5],
            "text": "1,2,3"
        }))
        .unwrap();

        assert_eq!(args["a"], ArgValue::Number(12.0));
        assert_eq!(args["flag"], ArgValue::Boolean(true));
        assert_eq!(args["values"], ArgValue::Sequence(vec![1.0, 2.5]));
        assert_eq!(args["text"], ArgValue::Text("1,2,3".to_owned()));
    }

    #[test]
    fn format_number_drops_integral_fraction() {
        assert_eq!(format_number(6.0), "6");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn operation_result_display() {
        assert_eq!(OperationResult::Number(6.into()).to_string(), "6");
        assert_eq!(
            OperationResult::Number(Number::from_f64(6.0).unwrap()).to_string(),
            "6"
        );
        assert_eq!(
            OperationResult::Sequence(vec![0.into(), 1.into(), 1.into(), 2.into()]).to_string(),
            "[0, 1, 1, 2]"
        );
        assert_eq!(OperationResult::Boolean(true).to_string(), "true");
    }

    #[test]
    fn large_integers_keep_every_digit() {
        let result: OperationResult =
            serde_json::from_value(json!([23_416_728_348_467_685_u64, 37_889_062_373_143_906_u64]))
                .unwrap();

        assert_eq!(result.to_string(), "[23416728348467685, 37889062373143906]");
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            "[23416728348467685,37889062373143906]"
        );
    }

    #[test]
    fn parameter_alias_lookup() {
        static PARAMS: [ParameterSpec; 1] = [ParameterSpec {
            name: "values",
            param_type: ParamType::Sequence,
            required: true,
            default: None,
            aliases: &["series"],
            constraint: None,
        }];
        let spec = OperationSpec {
            name: "moving_average",
            category: Category::Algorithms,
            description: "",
            parameters: &PARAMS,
            result: ResultType::Sequence,
        };

        assert_eq!(spec.parameter("series").map(|p| p.name), Some("values"));
        assert!(spec.parameter("window").is_none());
    }
}
