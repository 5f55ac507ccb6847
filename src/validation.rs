//! Request payload checks shared by the patient, professional and
//! consultation request types.
//!
//! Problems are collected rather than returned on the first failure, so a
//! client gets every complaint about a payload in one response.

use chrono::NaiveDate;
use thiserror::Error;

/// Date format accepted on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .problems.join("; "))]
pub struct ValidationError {
    pub problems: Vec<String>,
}

impl ValidationError {
    pub fn single(problem: impl Into<String>) -> Self {
        Self {
            problems: vec![problem.into()],
        }
    }
}

/// Accumulates problems found while checking one payload.
#[derive(Debug, Default)]
pub struct Problems(Vec<String>);

impl Problems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, problem: impl Into<String>) {
        self.0.push(problem.into());
    }

    pub fn check(&mut self, ok: bool, problem: impl Into<String>) {
        if !ok {
            self.push(problem);
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { problems: self.0 })
        }
    }
}

/// Trim in place; whitespace-only strings become `None`.
pub fn clean(value: &mut Option<String>) {
    if let Some(v) = value.take() {
        let trimmed = v.trim();
        if !trimmed.is_empty() {
            *value = Some(trimmed.to_string());
        }
    }
}

/// Keep only ASCII digits.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// A CPF is exactly eleven digits once formatting is stripped.
pub fn is_valid_cpf(cpf: &str) -> bool {
    cpf.len() == 11 && cpf.chars().all(|c| c.is_ascii_digit())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Check a required text field's presence and length (in characters).
pub fn check_text(
    problems: &mut Problems,
    label: &str,
    value: Option<&str>,
    min: usize,
    max: usize,
) {
    match value {
        None => problems.push(format!("{label} is required")),
        Some(v) => check_length(problems, label, v, min, max),
    }
}

/// Check the length of a text field that is present.
pub fn check_length(problems: &mut Problems, label: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        problems.push(format!("{label} must be between {min} and {max} characters"));
    }
}
