//! Argument validation against an [`OperationSpec`].

use math_tools_sdk::{
    ArgValue, ArgumentViolation, Arguments, Constraint, DefaultValue, OperationSpec, ParamType,
    ParameterSpec, ViolationKind, format_number,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Schema-conformant arguments, keyed by canonical parameter name.
///
/// Serializes as a JSON object with sorted keys; integer parameters are JSON
/// integers and defaults are filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedArguments(BTreeMap<&'static str, Value>);

impl ValidatedArguments {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    #[must_use]
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    #[must_use]
    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    #[must_use]
    pub fn sequence(&self, name: &str) -> Option<Vec<f64>> {
        self.get(name)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_f64).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validate `args` against `spec`.
///
/// Every declared parameter is checked and every violation is collected;
/// nothing is coerced beyond the documented text parsing and integral
/// float to integer conversion.
///
/// # Errors
/// Returns all violations when any argument is missing, mistyped, out of
/// range, undeclared or supplied under more than one spelling.
pub fn validate(
    spec: &OperationSpec,
    args: &Arguments,
) -> Result<ValidatedArguments, Vec<ArgumentViolation>> {
    let mut supplied: BTreeMap<&'static str, Vec<(&str, &ArgValue)>> = BTreeMap::new();
    let mut unexpected = Vec::new();

    for (key, value) in args {
        match spec.parameter(key) {
            Some(param) => supplied
                .entry(param.name)
                .or_default()
                .push((key.as_str(), value)),
            None => unexpected.push(ArgumentViolation::new(
                key.clone(),
                ViolationKind::Unexpected,
                format!("unexpected parameter for '{}'", spec.name),
            )),
        }
    }

    let mut normalized = BTreeMap::new();
    let mut violations = Vec::new();

    for param in spec.parameters {
        match supplied.get(param.name).map(Vec::as_slice) {
            Some([(_, value)]) => match normalize(param, value) {
                Ok(json) => {
                    normalized.insert(param.name, json);
                }
                Err(violation) => violations.push(violation),
            },
            Some(spellings) if spellings.len() > 1 => {
                let names: Vec<String> = spellings.iter().map(|(k, _)| format!("'{k}'")).collect();
                violations.push(ArgumentViolation::new(
                    param.name,
                    ViolationKind::DuplicateAlias,
                    format!("supplied more than once (as {})", names.join(" and ")),
                ));
            }
            _ => {
                if let Some(default) = param.default {
                    normalized.insert(param.name, default_json(default));
                } else if param.required {
                    violations.push(ArgumentViolation::new(
                        param.name,
                        ViolationKind::Missing,
                        format!("required {} parameter is missing", param.param_type),
                    ));
                }
            }
        }
    }

    violations.extend(unexpected);
    if violations.is_empty() {
        Ok(ValidatedArguments(normalized))
    } else {
        Err(violations)
    }
}

fn default_json(default: DefaultValue) -> Value {
    match default {
        DefaultValue::Boolean(b) => Value::Bool(b),
    }
}

fn normalize(param: &ParameterSpec, value: &ArgValue) -> Result<Value, ArgumentViolation> {
    let wrong_type = |detail: String| {
        ArgumentViolation::new(
            param.name,
            ViolationKind::WrongType,
            format!("expected {}, got {detail}", param.param_type),
        )
    };

    let json = match param.param_type {
        ParamType::Number => Value::from(to_number(value).map_err(wrong_type)?),
        ParamType::Integer => Value::from(to_integer(value).map_err(wrong_type)?),
        ParamType::Sequence => Value::from(to_sequence(value).map_err(wrong_type)?),
        ParamType::Boolean => Value::Bool(to_boolean(value).map_err(wrong_type)?),
    };

    if let Some(constraint) = param.constraint {
        check_constraint(param, constraint, &json)?;
    }
    Ok(json)
}

fn check_constraint(
    param: &ParameterSpec,
    constraint: Constraint,
    value: &Value,
) -> Result<(), ArgumentViolation> {
    match constraint {
        Constraint::Positive => match value.as_f64() {
            Some(n) if n > 0.0 => Ok(()),
            _ => Err(ArgumentViolation::new(
                param.name,
                ViolationKind::Constraint,
                format!("{constraint} (got {value})"),
            )),
        },
    }
}

fn describe(value: &ArgValue) -> String {
    match value {
        ArgValue::Text(s) => format!("text '{s}'"),
        ArgValue::Number(n) => format!("number {}", format_number(*n)),
        other => other.kind().to_owned(),
    }
}

fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn to_number(value: &ArgValue) -> Result<f64, String> {
    match value {
        ArgValue::Number(n) if n.is_finite() => Ok(*n),
        ArgValue::Text(s) => parse_finite(s).ok_or_else(|| describe(value)),
        ArgValue::Number(_) => Err("a non-finite number".to_owned()),
        ArgValue::Boolean(_) | ArgValue::Sequence(_) => Err(describe(value)),
    }
}

/// Convert an integral float inside the `i64` range.
#[allow(clippy::cast_possible_truncation)] // integral and range-checked before the cast
fn integral(n: f64) -> Option<i64> {
    // -2^63 and 2^63, both exactly representable
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    if n.is_finite() && n.fract() == 0.0 && (LOWER..UPPER).contains(&n) {
        Some(n as i64)
    } else {
        None
    }
}

fn to_integer(value: &ArgValue) -> Result<i64, String> {
    match value {
        ArgValue::Number(n) => integral(*n).ok_or_else(|| describe(value)),
        ArgValue::Text(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| parse_finite(trimmed).and_then(integral))
                .ok_or_else(|| describe(value))
        }
        ArgValue::Boolean(_) | ArgValue::Sequence(_) => Err(describe(value)),
    }
}

fn to_sequence(value: &ArgValue) -> Result<Vec<f64>, String> {
    match value {
        ArgValue::Sequence(items) => {
            if let Some(pos) = items.iter().position(|n| !n.is_finite()) {
                return Err(format!("a non-finite item at position {pos}"));
            }
            Ok(items.clone())
        }
        ArgValue::Text(s) => s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| parse_finite(item).ok_or_else(|| format!("non-numeric item '{item}'")))
            .collect(),
        ArgValue::Number(_) | ArgValue::Boolean(_) => Err(describe(value)),
    }
}

/// Parse a boolean spelled as true/false, yes/no, on/off or 1/0.
#[must_use]
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn to_boolean(value: &ArgValue) -> Result<bool, String> {
    match value {
        ArgValue::Boolean(b) => Ok(*b),
        ArgValue::Text(s) => parse_bool(s).ok_or_else(|| describe(value)),
        ArgValue::Number(_) | ArgValue::Sequence(_) => Err(describe(value)),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::registry::lookup;
    use math_tools_sdk::arguments;
    use serde_json::json;

    fn check(op: &str, args: Arguments) -> Result<ValidatedArguments, Vec<ArgumentViolation>> {
        validate(lookup(op).unwrap(), &args)
    }

    fn kinds(violations: &[ArgumentViolation]) -> Vec<(&str, ViolationKind)> {
        violations
            .iter()
            .map(|v| (v.parameter.as_str(), v.kind))
            .collect()
    }

    #[test]
    fn numbers_accept_floats_and_numeric_text() {
        let validated =
            check("add", arguments([("a", ArgValue::from(1.5)), ("b", "2".into())])).unwrap();
        assert_eq!(
            serde_json::to_value(&validated).unwrap(),
            json!({"a": 1.5, "b": 2.0})
        );
    }

    #[test]
    fn boolean_is_never_a_number() {
        let err =
            check("add", arguments([("a", ArgValue::from(true)), ("b", 1.into())])).unwrap_err();
        assert_eq!(kinds(&err), vec![("a", ViolationKind::WrongType)]);
        assert!(err[0].message.contains("expected number, got boolean"));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let err = check(
            "multiply",
            arguments([("a", ArgValue::from(f64::INFINITY)), ("b", "NaN".into())]),
        )
        .unwrap_err();
        assert_eq!(
            kinds(&err),
            vec![("a", ViolationKind::WrongType), ("b", ViolationKind::WrongType)]
        );
    }

    #[test]
    fn integers_are_coerced_from_integral_values() {
        let validated = check(
            "gcd",
            arguments([("a", ArgValue::from(12.0)), ("b", " 18 ".into())]),
        )
        .unwrap();
        let wire = serde_json::to_string(&validated).unwrap();
        assert_eq!(wire, r#"{"a":12,"b":18}"#);
        assert_eq!(validated.integer("a"), Some(12));
    }

    #[test]
    fn fractional_integers_are_rejected() {
        let err = check(
            "lcm",
            arguments([("a", ArgValue::from(1.5)), ("b", "2.5".into())]),
        )
        .unwrap_err();
        assert_eq!(
            kinds(&err),
            vec![("a", ViolationKind::WrongType), ("b", ViolationKind::WrongType)]
        );
        assert!(err[0].message.contains("expected integer, got number 1.5"));
    }

    #[test]
    fn integer_text_with_trailing_zero_fraction_is_accepted() {
        let validated = check("is_prime", arguments([("n", "97.0")])).unwrap();
        assert_eq!(validated.integer("n"), Some(97));
    }

    #[test]
    fn out_of_range_integer_is_rejected() {
        let err = check("fibonacci", arguments([("n", ArgValue::from(1e19))])).unwrap_err();
        assert_eq!(kinds(&err), vec![("n", ViolationKind::WrongType)]);
    }

    #[test]
    fn sequences_accept_lists_and_csv_text() {
        let from_list = check("mean", arguments([("values", vec![1.0, 2.0, 3.0])])).unwrap();
        let from_text = check("mean", arguments([("values", " 1, 2,,3 ,")])).unwrap();
        assert_eq!(from_list, from_text);
        assert_eq!(from_text.sequence("values"), Some(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn bare_number_is_not_a_sequence() {
        let err = check("median", arguments([("values", 5)])).unwrap_err();
        assert_eq!(kinds(&err), vec![("values", ViolationKind::WrongType)]);
    }

    #[test]
    fn csv_with_garbage_names_the_item() {
        let err = check("sort", arguments([("values", "1, two, 3")])).unwrap_err();
        assert!(err[0].message.contains("'two'"));
    }

    #[test]
    fn empty_sequence_is_left_to_the_server() {
        let validated = check("mean", arguments([("values", "")])).unwrap();
        assert_eq!(validated.sequence("values"), Some(vec![]));
    }

    #[test]
    fn booleans_accept_common_spellings() {
        for (text, expected) in [
            ("TRUE", true),
            ("yes", true),
            ("On", true),
            ("1", true),
            ("false", false),
            ("NO", false),
            ("off", false),
            ("0", false),
        ] {
            let validated = check(
                "std",
                arguments([("values", ArgValue::from("1,2")), ("sample", text.into())]),
            )
            .unwrap();
            assert_eq!(validated.boolean("sample"), Some(expected), "{text}");
        }

        let err = check(
            "std",
            arguments([("values", ArgValue::from("1,2")), ("sample", "maybe".into())]),
        )
        .unwrap_err();
        assert_eq!(kinds(&err), vec![("sample", ViolationKind::WrongType)]);
    }

    #[test]
    fn numbers_are_not_booleans() {
        let err = check(
            "sort",
            arguments([("values", ArgValue::from("3,1")), ("reverse", 1.into())]),
        )
        .unwrap_err();
        assert_eq!(kinds(&err), vec![("reverse", ViolationKind::WrongType)]);
    }

    #[test]
    fn defaults_are_filled_in() {
        let validated = check("sort", arguments([("values", vec![3.0, 1.0])])).unwrap();
        assert_eq!(validated.boolean("reverse"), Some(false));
        assert_eq!(validated.len(), 2);
    }

    #[test]
    fn alias_maps_to_canonical_name() {
        let validated = check(
            "moving_average",
            arguments([("series", ArgValue::from(vec![1.0, 2.0, 3.0])), ("window", 2.into())]),
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(&validated).unwrap(),
            json!({"values": [1.0, 2.0, 3.0], "window": 2})
        );
    }

    #[test]
    fn zero_window_violates_constraint() {
        let err = check(
            "moving_average",
            arguments([("series", ArgValue::from(vec![1.0, 2.0, 3.0])), ("window", 0.into())]),
        )
        .unwrap_err();
        assert_eq!(kinds(&err), vec![("window", ViolationKind::Constraint)]);
        assert!(err[0].message.contains("greater than 0"));
    }

    #[test]
    fn duplicate_alias_is_reported() {
        let err = check(
            "rolling_max",
            arguments([
                ("series", ArgValue::from("1,2")),
                ("values", "3,4".into()),
                ("window", 1.into()),
            ]),
        )
        .unwrap_err();
        assert_eq!(kinds(&err), vec![("values", ViolationKind::DuplicateAlias)]);
        assert!(err[0].message.contains("'series'"));
    }

    #[test]
    fn all_violations_are_collected() {
        let err = check(
            "power",
            arguments([("base", ArgValue::from("x")), ("power", 2.into())]),
        )
        .unwrap_err();
        assert_eq!(
            kinds(&err),
            vec![
                ("base", ViolationKind::WrongType),
                ("exponent", ViolationKind::Missing),
                ("power", ViolationKind::Unexpected),
            ]
        );
    }

    #[test]
    fn every_required_parameter_is_reported_missing() {
        for spec in crate::domain::registry::all() {
            let err = validate(spec, &Arguments::new()).unwrap_err();
            let missing: Vec<_> = err.iter().map(|v| v.parameter.as_str()).collect();
            let required: Vec<_> = spec
                .parameters
                .iter()
                .filter(|p| p.required)
                .map(|p| p.name)
                .collect();
            assert_eq!(missing, required, "{}", spec.name);
        }
    }
}
