//! Advisory parameter validation
//!
//! Validators inspect the raw string values entered for one parameter and
//! report a [`ValidationResult`]. Nothing here blocks building or sending a
//! request; callers decide what to do with the results.

use discovery::ApiParameter;
use regex::Regex;
use tracing::warn;

/// Kind of a validation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    Valid,
    Info,
    Error,
}

/// Outcome of validating one parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub kind: ValidationKind,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            kind: ValidationKind::Valid,
            message: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::Info,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.kind == ValidationKind::Valid
    }

    pub fn is_error(&self) -> bool {
        self.kind == ValidationKind::Error
    }
}

/// Checks the values supplied for a parameter
pub trait Validator: Send + Sync {
    /// `values` is empty when the user supplied nothing
    fn is_valid(&self, values: &[String]) -> ValidationResult;
}

fn non_blank(values: &[String]) -> impl Iterator<Item = &str> {
    values.iter().map(|v| v.as_str()).filter(|v| !v.trim().is_empty())
}

/// Fails when no non-blank value is present
pub struct RequiredValidator;

impl Validator for RequiredValidator {
    fn is_valid(&self, values: &[String]) -> ValidationResult {
        if non_blank(values).next().is_none() {
            ValidationResult::error("This parameter is required")
        } else {
            ValidationResult::valid()
        }
    }
}

/// Notes that the server-side default will apply when nothing is given
pub struct DefaultValueValidator {
    pub default: String,
}

impl Validator for DefaultValueValidator {
    fn is_valid(&self, values: &[String]) -> ValidationResult {
        if non_blank(values).next().is_none() {
            ValidationResult::info(format!("Using default value: {}", self.default))
        } else {
            ValidationResult::valid()
        }
    }
}

/// Fails when a non-repeated parameter receives more than one value
pub struct RepeatedValidator;

impl Validator for RepeatedValidator {
    fn is_valid(&self, values: &[String]) -> ValidationResult {
        if non_blank(values).count() > 1 {
            ValidationResult::error("This parameter does not accept multiple values")
        } else {
            ValidationResult::valid()
        }
    }
}

/// Requires integer values, optionally within bounds
#[derive(Default)]
pub struct IntegerValidator {
    pub minimum: Option<i128>,
    pub maximum: Option<i128>,
}

impl IntegerValidator {
    /// Build from the string bounds used by discovery documents
    pub fn from_bounds(minimum: Option<&str>, maximum: Option<&str>) -> Self {
        Self {
            minimum: minimum.and_then(|m| m.trim().parse().ok()),
            maximum: maximum.and_then(|m| m.trim().parse().ok()),
        }
    }
}

impl Validator for IntegerValidator {
    fn is_valid(&self, values: &[String]) -> ValidationResult {
        for value in non_blank(values) {
            let parsed: i128 = match value.trim().parse() {
                Ok(v) => v,
                Err(_) => return ValidationResult::error(format!("{} is not a valid integer", value)),
            };
            if let Some(min) = self.minimum {
                if parsed < min {
                    return ValidationResult::error(format!("{} is less than the minimum of {}", value, min));
                }
            }
            if let Some(max) = self.maximum {
                if parsed > max {
                    return ValidationResult::error(format!("{} is greater than the maximum of {}", value, max));
                }
            }
        }
        ValidationResult::valid()
    }
}

/// Requires floating point values
pub struct NumberValidator;

impl Validator for NumberValidator {
    fn is_valid(&self, values: &[String]) -> ValidationResult {
        match non_blank(values).find(|v| v.trim().parse::<f64>().is_err()) {
            Some(bad) => ValidationResult::error(format!("{} is not a valid number", bad)),
            None => ValidationResult::valid(),
        }
    }
}

/// Requires "true" or "false"
pub struct BooleanValidator;

impl Validator for BooleanValidator {
    fn is_valid(&self, values: &[String]) -> ValidationResult {
        match non_blank(values).find(|v| !matches!(v.trim(), "true" | "false")) {
            Some(bad) => ValidationResult::error(format!("{} is not a valid boolean (true or false)", bad)),
            None => ValidationResult::valid(),
        }
    }
}

/// Requires one of a fixed set of values
pub struct EnumValidator {
    pub allowed: Vec<String>,
}

impl Validator for EnumValidator {
    fn is_valid(&self, values: &[String]) -> ValidationResult {
        match non_blank(values).find(|v| !self.allowed.iter().any(|a| a == v)) {
            Some(bad) => ValidationResult::error(format!(
                "{} is not one of: {}",
                bad,
                self.allowed.join(", ")
            )),
            None => ValidationResult::valid(),
        }
    }
}

/// Requires every value to fully match a regular expression
pub struct PatternValidator {
    pattern: String,
    regex: Regex,
}

impl PatternValidator {
    /// Compile a pattern; `None` if it is not a valid regular expression
    pub fn new(pattern: &str) -> Option<Self> {
        let anchored = format!("^(?:{})$", strip_anchors(pattern));
        match Regex::new(&anchored) {
            Ok(regex) => Some(Self {
                pattern: pattern.to_string(),
                regex,
            }),
            Err(e) => {
                warn!("Ignoring unsupported parameter pattern {}: {}", pattern, e);
                None
            }
        }
    }
}

/// Drop one leading `^` and one unescaped trailing `$`
fn strip_anchors(pattern: &str) -> &str {
    let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
    match pattern.strip_suffix('$') {
        Some(rest) if rest.chars().rev().take_while(|c| *c == '\\').count() % 2 == 0 => rest,
        _ => pattern,
    }
}

impl Validator for PatternValidator {
    fn is_valid(&self, values: &[String]) -> ValidationResult {
        match non_blank(values).find(|v| !self.regex.is_match(v)) {
            Some(bad) => ValidationResult::error(format!("{} does not match the pattern {}", bad, self.pattern)),
            None => ValidationResult::valid(),
        }
    }
}

/// How a [`ValidatorChain`] combines the results of its validators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositionPolicy {
    /// Stop at the first error; otherwise report the first info
    #[default]
    ShortCircuit,
    /// Run every validator and keep every non-valid result
    CollectAll,
}

/// Ordered list of validators for one parameter
#[derive(Default)]
pub struct ValidatorChain {
    validators: Vec<Box<dyn Validator>>,
    policy: CompositionPolicy,
}

impl ValidatorChain {
    pub fn new(policy: CompositionPolicy) -> Self {
        Self {
            validators: Vec::new(),
            policy,
        }
    }

    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn push(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn policy(&self) -> CompositionPolicy {
        self.policy
    }

    /// Build the chain for a discovery parameter.
    ///
    /// Order: required or default, repeated, type, enum, pattern.
    pub fn for_parameter(param: &ApiParameter, policy: CompositionPolicy) -> Self {
        let mut chain = Self::new(policy);

        if param.required {
            chain.push(Box::new(RequiredValidator));
        } else if let Some(default) = &param.default {
            chain.push(Box::new(DefaultValueValidator {
                default: default.clone(),
            }));
        }

        if !param.repeated {
            chain.push(Box::new(RepeatedValidator));
        }

        match param.param_type.as_deref() {
            Some("integer") => chain.push(Box::new(IntegerValidator::from_bounds(
                param.minimum.as_deref(),
                param.maximum.as_deref(),
            ))),
            Some("number") => chain.push(Box::new(NumberValidator)),
            Some("boolean") => chain.push(Box::new(BooleanValidator)),
            _ => {}
        }

        if !param.enum_values.is_empty() {
            chain.push(Box::new(EnumValidator {
                allowed: param.enum_values.clone(),
            }));
        }

        if let Some(pattern) = param.pattern.as_deref().and_then(PatternValidator::new) {
            chain.push(Box::new(pattern));
        }

        chain
    }

    /// Results according to the chain's policy; empty means valid
    pub fn validate(&self, values: &[String]) -> Vec<ValidationResult> {
        match self.policy {
            CompositionPolicy::ShortCircuit => {
                let mut first_info = None;
                for validator in &self.validators {
                    let result = validator.is_valid(values);
                    match result.kind {
                        ValidationKind::Error => return vec![result],
                        ValidationKind::Info if first_info.is_none() => first_info = Some(result),
                        _ => {}
                    }
                }
                first_info.into_iter().collect()
            }
            CompositionPolicy::CollectAll => self
                .validators
                .iter()
                .map(|v| v.is_valid(values))
                .filter(|r| !r.is_valid())
                .collect(),
        }
    }
}

impl Validator for ValidatorChain {
    /// The most severe result, earliest first among equals
    fn is_valid(&self, values: &[String]) -> ValidationResult {
        let results = self.validate(values);
        results
            .iter()
            .find(|r| r.is_error())
            .or_else(|| results.first())
            .cloned()
            .unwrap_or_else(ValidationResult::valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_required() {
        assert!(RequiredValidator.is_valid(&[]).is_error());
        assert!(RequiredValidator.is_valid(&values(&["  "])).is_error());
        assert!(RequiredValidator.is_valid(&values(&["x"])).is_valid());
    }

    #[test]
    fn test_default_value_info() {
        let validator = DefaultValueValidator {
            default: "10".to_string(),
        };

        let result = validator.is_valid(&[]);
        assert_eq!(result.kind, ValidationKind::Info);
        assert_eq!(result.message.as_deref(), Some("Using default value: 10"));
        assert!(validator.is_valid(&values(&["5"])).is_valid());
    }

    #[test]
    fn test_integer_bounds() {
        let validator = IntegerValidator::from_bounds(Some("1"), Some("100"));

        assert!(validator.is_valid(&[]).is_valid());
        assert!(validator.is_valid(&values(&["50"])).is_valid());
        assert!(validator.is_valid(&values(&["0"])).is_error());
        assert!(validator.is_valid(&values(&["101"])).is_error());

        let result = validator.is_valid(&values(&["abc"]));
        assert_eq!(result.message.as_deref(), Some("abc is not a valid integer"));
    }

    #[test]
    fn test_number_and_boolean() {
        assert!(NumberValidator.is_valid(&values(&["1.5"])).is_valid());
        assert!(NumberValidator.is_valid(&values(&["one"])).is_error());
        assert!(BooleanValidator.is_valid(&values(&["true", "false"])).is_valid());
        assert!(BooleanValidator.is_valid(&values(&["yes"])).is_error());
    }

    #[test]
    fn test_enum() {
        let validator = EnumValidator {
            allowed: values(&["FULL", "ANALYTICS_CLICKS"]),
        };
        assert!(validator.is_valid(&values(&["FULL"])).is_valid());
        assert!(validator.is_valid(&values(&["full"])).is_error());
    }

    #[test]
    fn test_pattern_full_match() {
        let validator = PatternValidator::new("[a-z]+").unwrap();
        assert!(validator.is_valid(&values(&["abc"])).is_valid());
        assert!(validator.is_valid(&values(&["abc1"])).is_error());

        let anchored = PatternValidator::new("^[0-9]{2}$").unwrap();
        assert!(anchored.is_valid(&values(&["42"])).is_valid());

        assert!(PatternValidator::new("(unclosed").is_none());
    }

    #[test]
    fn test_pattern_escaped_dollar() {
        let price = PatternValidator::new(r"[0-9]+\$").unwrap();
        assert!(price.is_valid(&values(&["10$"])).is_valid());
        assert!(price.is_valid(&values(&["10"])).is_error());

        let both = PatternValidator::new(r"^\$[0-9]+\\$").unwrap();
        assert!(both.is_valid(&values(&[r"$5\"])).is_valid());

        assert_eq!(strip_anchors("^^a$$"), "^a$");
        assert_eq!(strip_anchors(r"a\$"), r"a\$");
    }

    #[test]
    fn test_repeated() {
        assert!(RepeatedValidator.is_valid(&values(&["a"])).is_valid());
        assert!(RepeatedValidator.is_valid(&values(&["a", "b"])).is_error());
    }

    #[test]
    fn test_short_circuit_stops_at_first_error() {
        let chain = ValidatorChain::new(CompositionPolicy::ShortCircuit)
            .with(DefaultValueValidator {
                default: "1".to_string(),
            })
            .with(RepeatedValidator)
            .with(IntegerValidator::default());

        let results = chain.validate(&values(&["x", "y"]));
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].message.as_deref(),
            Some("This parameter does not accept multiple values")
        );

        let results = chain.validate(&[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, ValidationKind::Info);

        assert!(chain.validate(&values(&["7"])).is_empty());
    }

    #[test]
    fn test_collect_all_keeps_order() {
        let chain = ValidatorChain::new(CompositionPolicy::CollectAll)
            .with(RepeatedValidator)
            .with(IntegerValidator::default())
            .with(EnumValidator {
                allowed: values(&["1"]),
            });

        let results = chain.validate(&values(&["x", "y"]));
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[1].message.as_deref(),
            Some("x is not a valid integer")
        );
        assert!(results.iter().all(|r| r.is_error()));
    }

    #[test]
    fn test_chain_as_validator_reports_most_severe() {
        let chain = ValidatorChain::new(CompositionPolicy::CollectAll)
            .with(DefaultValueValidator {
                default: "a".to_string(),
            })
            .with(RequiredValidator);

        let result = chain.is_valid(&[]);
        assert!(result.is_error());
        assert!(ValidatorChain::default().is_valid(&[]).is_valid());
    }

    #[test]
    fn test_for_parameter() {
        let param = ApiParameter {
            param_type: Some("integer".to_string()),
            required: true,
            minimum: Some("0".to_string()),
            maximum: Some("10".to_string()),
            ..Default::default()
        };
        let chain = ValidatorChain::for_parameter(&param, CompositionPolicy::ShortCircuit);

        assert_eq!(chain.len(), 3);
        assert!(chain.is_valid(&[]).is_error());
        assert!(chain.is_valid(&values(&["11"])).is_error());
        assert!(chain.is_valid(&values(&["3"])).is_valid());
    }

    #[test]
    fn test_for_parameter_optional_with_default() {
        let param = ApiParameter {
            param_type: Some("string".to_string()),
            default: Some("FULL".to_string()),
            repeated: true,
            enum_values: values(&["FULL", "CLICKS"]),
            ..Default::default()
        };
        let chain = ValidatorChain::for_parameter(&param, CompositionPolicy::ShortCircuit);

        let result = chain.is_valid(&[]);
        assert_eq!(result.kind, ValidationKind::Info);
        assert!(chain.is_valid(&values(&["FULL", "CLICKS"])).is_valid());
        assert!(chain.is_valid(&values(&["NONE"])).is_error());
    }
}
