use std::collections::HashMap;

use serde_json::Value;

use super::error::TypeError;

pub type FormData = HashMap<String, Value>;

/// Loosely typed request payload. Each getter returns `None` when the key is
/// absent and otherwise the coerced value or the reason it was refused.
#[derive(Debug, Clone, Default)]
pub struct Form {
    inner: FormData,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn get_str(
        &self,
        key: &str,
        max_length: usize,
        allow_blank: bool,
    ) -> Option<Result<String, TypeError>> {
        self.inner
            .get(key)
            .map(|value| coerce_str(value, max_length, allow_blank))
    }

    pub fn get_integer(&self, key: &str) -> Option<Result<i32, TypeError>> {
        self.inner.get(key).map(coerce_integer)
    }

    pub fn get_decimal(
        &self,
        key: &str,
        max_digits: usize,
        decimal_places: usize,
    ) -> Option<Result<f64, TypeError>> {
        self.inner
            .get(key)
            .map(|value| coerce_decimal(value, max_digits, decimal_places))
    }

    pub fn get_list(&self, key: &str) -> Option<Result<Vec<Form>, TypeError>> {
        self.inner.get(key).map(coerce_list)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

pub fn coerce_str(
    value: &Value,
    max_length: usize,
    allow_blank: bool,
) -> Result<String, TypeError> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Null => return Err(TypeError::new("This field may not be null.")),
        _ => return Err(TypeError::new("Not a valid string.")),
    };

    if text.is_empty() && !allow_blank {
        return Err(TypeError::new("This field may not be blank."));
    }
    if text.chars().count() > max_length {
        return Err(TypeError::new(&format!(
            "Ensure this field has no more than {max_length} characters."
        )));
    }

    Ok(text)
}

pub fn coerce_integer(value: &Value) -> Result<i32, TypeError> {
    let invalid = || TypeError::new("A valid integer is required.");

    let number: i64 = match value {
        Value::Number(number) => match number.as_i64() {
            Some(number) => number,
            None => match number.as_f64() {
                Some(float) if float.fract() == 0.0 && float.is_finite() => float as i64,
                _ => return Err(invalid()),
            },
        },
        Value::String(text) => text.trim().parse().map_err(|_| invalid())?,
        Value::Null => return Err(TypeError::new("This field may not be null.")),
        _ => return Err(invalid()),
    };

    i32::try_from(number).map_err(|_| {
        if number.is_negative() {
            TypeError::new(&format!(
                "Ensure this value is greater than or equal to {}.",
                i32::MIN
            ))
        } else {
            TypeError::new(&format!(
                "Ensure this value is less than or equal to {}.",
                i32::MAX
            ))
        }
    })
}

pub fn coerce_decimal(
    value: &Value,
    max_digits: usize,
    decimal_places: usize,
) -> Result<f64, TypeError> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        Value::Null => return Err(TypeError::new("This field may not be null.")),
        _ => return Err(TypeError::new("A valid number is required.")),
    };

    parse_decimal(&text, max_digits, decimal_places)
}

/// Plain decimal notation only: optional sign, digits, optional fraction.
pub fn parse_decimal(
    text: &str,
    max_digits: usize,
    decimal_places: usize,
) -> Result<f64, TypeError> {
    let invalid = || TypeError::new("A valid number is required.");

    let unsigned = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole_digits = whole.trim_start_matches('0').len();
    let fraction_digits = fraction.len();

    if whole_digits + fraction_digits > max_digits {
        return Err(TypeError::new(&format!(
            "Ensure that there are no more than {max_digits} digits in total."
        )));
    }
    if fraction_digits > decimal_places {
        return Err(TypeError::new(&format!(
            "Ensure that there are no more than {decimal_places} decimal places."
        )));
    }
    if whole_digits > max_digits - decimal_places {
        return Err(TypeError::new(&format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            max_digits - decimal_places
        )));
    }

    text.parse::<f64>().map_err(|_| invalid())
}

pub fn coerce_list(value: &Value) -> Result<Vec<Form>, TypeError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(Form::from_data(
                    map.iter()
                        .map(|(key, value)| (key.to_owned(), value.to_owned()))
                        .collect(),
                )),
                other => Err(TypeError::new(&format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    type_name(other)
                ))),
            })
            .collect(),
        Value::Null => Err(TypeError::new("This field may not be null.")),
        other => Err(TypeError::new(&format!(
            "Expected a list of items but got type \"{}\".",
            type_name(other)
        ))),
    }
}
