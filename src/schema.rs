//! Validation of single-record prediction requests.
//!
//! Every field is checked on its own so that a rejected request reports all
//! offending fields at once.

use serde_json::{Map, Value};

use crate::error::{FieldError, ValidationErrors};
use crate::types::ModelChoice;

/// A validated patient record as submitted to `POST /api/predict`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientInput {
    pub pregnancies: i64,
    pub glucose: f64,
    pub bp: f64,
    pub bmi: f64,
    pub dpf: f64,
    pub age: i64,
    pub model_choice: ModelChoice,
}

impl PatientInput {
    /// Validate a raw JSON body.
    ///
    /// # Errors
    /// Returns every failing field when the body is not a valid record.
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let Some(object) = body.as_object() else {
            return Err(ValidationErrors::single(FieldError::body(
                None,
                "model_attributes_type",
                "Input should be a valid dictionary or object to extract fields from",
            )));
        };

        let mut errors = Vec::new();
        let pregnancies = required(object, &mut errors, "pregnancies");
        let glucose = required(object, &mut errors, "glucose");
        let bp = required(object, &mut errors, "bp");
        let bmi = required(object, &mut errors, "bmi");
        let dpf = required(object, &mut errors, "dpf");
        let age = required(object, &mut errors, "age");

        let pregnancies = pregnancies.and_then(|v| integer(&mut errors, "pregnancies", v, 0));
        let glucose = glucose.and_then(|v| real(&mut errors, "glucose", v));
        let bp = bp.and_then(|v| real(&mut errors, "bp", v));
        let bmi = bmi.and_then(|v| real(&mut errors, "bmi", v));
        let dpf = dpf.and_then(|v| real(&mut errors, "dpf", v));
        let age = age.and_then(|v| integer(&mut errors, "age", v, 1));

        let model_choice = match object.get("model_choice") {
            None => Some(ModelChoice::default()),
            Some(Value::String(token)) => match token.parse::<ModelChoice>() {
                Ok(choice) => Some(choice),
                Err(err) => {
                    errors.push(FieldError::body(Some("model_choice"), "enum", err.to_string()));
                    None
                }
            },
            Some(other) => {
                errors.push(FieldError::body(
                    Some("model_choice"),
                    "enum",
                    format!("Input should be 'logistic' or 'dt', got {other}"),
                ));
                None
            }
        };

        match (pregnancies, glucose, bp, bmi, dpf, age, model_choice) {
            (
                Some(pregnancies),
                Some(glucose),
                Some(bp),
                Some(bmi),
                Some(dpf),
                Some(age),
                Some(model_choice),
            ) if errors.is_empty() => Ok(Self {
                pregnancies,
                glucose,
                bp,
                bmi,
                dpf,
                age,
                model_choice,
            }),
            _ => Err(ValidationErrors { errors }),
        }
    }

    /// The six feature fields under their external names, in request order.
    pub fn feature_fields(&self) -> [(&'static str, f64); 6] {
        [
            ("pregnancies", self.pregnancies as f64),
            ("glucose", self.glucose),
            ("bp", self.bp),
            ("bmi", self.bmi),
            ("dpf", self.dpf),
            ("age", self.age as f64),
        ]
    }
}

fn required<'a>(
    object: &'a Map<String, Value>,
    errors: &mut Vec<FieldError>,
    name: &'static str,
) -> Option<&'a Value> {
    let value = object.get(name);
    if value.is_none() {
        errors.push(FieldError::body(Some(name), "missing", "Field required"));
    }
    value
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn real(errors: &mut Vec<FieldError>, name: &'static str, value: &Value) -> Option<f64> {
    let Some(n) = number(value) else {
        errors.push(FieldError::body(
            Some(name),
            "float_parsing",
            "Input should be a valid number",
        ));
        return None;
    };
    if n < 0.0 {
        errors.push(FieldError::body(
            Some(name),
            "greater_than_equal",
            "Input should be greater than or equal to 0",
        ));
        return None;
    }
    Some(n)
}

fn integer(errors: &mut Vec<FieldError>, name: &'static str, value: &Value, min: i64) -> Option<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    let Some(n) = parsed else {
        errors.push(FieldError::body(
            Some(name),
            "int_parsing",
            "Input should be a valid integer",
        ));
        return None;
    };
    if n < min {
        errors.push(FieldError::body(
            Some(name),
            "greater_than_equal",
            format!("Input should be greater than or equal to {min}"),
        ));
        return None;
    }
    Some(n)
}
