//! Customer record accepted by the prediction endpoint

use crate::error::{FieldError, ValidationError};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declares a closed set of categorical values with their wire spelling.
macro_rules! categorical {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// All accepted values, in declaration order
            pub const VALUES: &'static [&'static str] = &[$($wire),+];

            /// Wire spelling of this value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }
    };
}

categorical!(
    /// Job category
    Job {
        Management => "management",
        Technician => "technician",
        Entrepreneur => "entrepreneur",
        BlueCollar => "blue-collar",
        Unknown => "unknown",
        Retired => "retired",
        Admin => "admin.",
        Services => "services",
        SelfEmployed => "self-employed",
        Unemployed => "unemployed",
        Housemaid => "housemaid",
        Student => "student",
    }
);

categorical!(
    /// Marital status
    Marital {
        Married => "married",
        Single => "single",
        Divorced => "divorced",
    }
);

categorical!(
    /// Education level
    Education {
        Tertiary => "tertiary",
        Secondary => "secondary",
        Unknown => "unknown",
        Primary => "primary",
    }
);

categorical!(
    /// Binary yes/no attribute
    YesNo {
        No => "no",
        Yes => "yes",
    }
);

categorical!(
    /// Contact communication type
    Contact {
        Unknown => "unknown",
        Cellular => "cellular",
        Telephone => "telephone",
    }
);

categorical!(
    /// Month of last contact
    Month {
        Jan => "jan",
        Feb => "feb",
        Mar => "mar",
        Apr => "apr",
        May => "may",
        Jun => "jun",
        Jul => "jul",
        Aug => "aug",
        Sep => "sep",
        Oct => "oct",
        Nov => "nov",
        Dec => "dec",
    }
);

categorical!(
    /// Outcome of the previous marketing campaign
    Poutcome {
        Unknown => "unknown",
        Other => "other",
        Failure => "failure",
        Success => "success",
    }
);

/// Customer attributes scored by the model.
///
/// Numeric fields also accept numeric strings, and integer fields accept
/// whole-number floats such as `35.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CustomerRecord {
    /// Customer age (18-120)
    #[schemars(range(min = 18, max = 120))]
    pub age: i64,

    /// Average yearly balance
    pub balance: f64,

    /// Last contact duration in seconds
    #[schemars(range(min = 0))]
    pub duration: i64,

    /// Number of contacts during this campaign
    #[schemars(range(min = 1))]
    pub campaign: i64,

    /// Number of contacts before this campaign
    #[schemars(range(min = 0))]
    pub previous: i64,

    pub job: Job,
    pub marital: Marital,
    pub education: Education,
    pub default: YesNo,
    pub housing: YesNo,
    pub loan: YesNo,
    pub contact: Contact,
    pub month: Month,
    pub poutcome: Poutcome,
}

impl CustomerRecord {
    /// Names of all required fields
    pub const FIELDS: [&'static str; 14] = [
        "age",
        "balance",
        "duration",
        "campaign",
        "previous",
        "job",
        "marital",
        "education",
        "default",
        "housing",
        "loan",
        "contact",
        "month",
        "poutcome",
    ];

    /// Build a record from an untyped JSON body.
    ///
    /// Every field is checked so the caller receives the complete list of
    /// problems. Numeric fields accept numeric strings, and integer fields
    /// accept floats without a fractional part.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let obj = match body.as_object() {
            Some(obj) => obj,
            None => {
                return Err(ValidationError::single(
                    "body",
                    "expected a JSON object",
                ))
            }
        };

        let mut errors = Vec::new();
        let age = int_field(obj, "age", Some(18), Some(120), &mut errors);
        let balance = float_field(obj, "balance", &mut errors);
        let duration = int_field(obj, "duration", Some(0), None, &mut errors);
        let campaign = int_field(obj, "campaign", Some(1), None, &mut errors);
        let previous = int_field(obj, "previous", Some(0), None, &mut errors);
        let job = enum_field::<Job>(obj, "job", Job::VALUES, &mut errors);
        let marital = enum_field::<Marital>(obj, "marital", Marital::VALUES, &mut errors);
        let education = enum_field::<Education>(obj, "education", Education::VALUES, &mut errors);
        let default = enum_field::<YesNo>(obj, "default", YesNo::VALUES, &mut errors);
        let housing = enum_field::<YesNo>(obj, "housing", YesNo::VALUES, &mut errors);
        let loan = enum_field::<YesNo>(obj, "loan", YesNo::VALUES, &mut errors);
        let contact = enum_field::<Contact>(obj, "contact", Contact::VALUES, &mut errors);
        let month = enum_field::<Month>(obj, "month", Month::VALUES, &mut errors);
        let poutcome = enum_field::<Poutcome>(obj, "poutcome", Poutcome::VALUES, &mut errors);

        match (
            age, balance, duration, campaign, previous, job, marital, education, default,
            housing, loan, contact, month, poutcome,
        ) {
            (
                Some(age),
                Some(balance),
                Some(duration),
                Some(campaign),
                Some(previous),
                Some(job),
                Some(marital),
                Some(education),
                Some(default),
                Some(housing),
                Some(loan),
                Some(contact),
                Some(month),
                Some(poutcome),
            ) if errors.is_empty() => Ok(Self {
                age,
                balance,
                duration,
                campaign,
                previous,
                job,
                marital,
                education,
                default,
                housing,
                loan,
                contact,
                month,
                poutcome,
            }),
            _ => Err(ValidationError { errors }),
        }
    }
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a Value> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, "field required"));
            None
        }
        Some(value) => Some(value),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn int_field(
    obj: &Map<String, Value>,
    field: &str,
    min: Option<i64>,
    max: Option<i64>,
    errors: &mut Vec<FieldError>,
) -> Option<i64> {
    let value = required(obj, field, errors)?;

    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole))
        }
        _ => None,
    };

    let Some(n) = parsed else {
        errors.push(FieldError::new(field, "value is not a valid integer"));
        return None;
    };

    if let Some(min) = min {
        if n < min {
            errors.push(FieldError::new(
                field,
                format!("must be greater than or equal to {}", min),
            ));
            return None;
        }
    }
    if let Some(max) = max {
        if n > max {
            errors.push(FieldError::new(
                field,
                format!("must be less than or equal to {}", max),
            ));
            return None;
        }
    }
    Some(n)
}

fn whole(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn float_field(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    let value = required(obj, field, errors)?;
    match as_number(value) {
        Some(n) if n.is_finite() => Some(n),
        _ => {
            errors.push(FieldError::new(field, "value is not a valid number"));
            None
        }
    }
}

fn enum_field<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    field: &str,
    allowed: &[&str],
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    let value = required(obj, field, errors)?;
    match serde_json::from_value::<T>(value.clone()) {
        Ok(v) => Some(v),
        Err(_) => {
            let message = match value {
                Value::String(s) => format!(
                    "unexpected value `{}`; expected one of: {}",
                    s,
                    allowed.join(", ")
                ),
                _ => "value is not a valid string".to_string(),
            };
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_body() -> Value {
    serde_json::json!({
        "age": 35,
        "job": "technician",
        "marital": "married",
        "education": "secondary",
        "default": "no",
        "balance": 1500,
        "housing": "yes",
        "loan": "no",
        "contact": "cellular",
        "month": "may",
        "duration": 120,
        "campaign": 2,
        "previous": 0,
        "poutcome": "unknown"
    })
}
