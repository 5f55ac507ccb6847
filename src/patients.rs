//! Patient request payloads and login credentials.

use serde::Deserialize;
use zeroize::Zeroize;

use crate::crypto::hash_password;
use crate::models::{NewPatient, Patient};
use crate::validation::{self, Problems, ValidationError};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;
pub const SERVICE_MODE_MAX_CHARS: usize = 30;
pub const PASSWORD_MIN_CHARS: usize = 6;
pub const PASSWORD_MAX_CHARS: usize = 8;
pub const AGE_MAX: i64 = 120;
pub const TECH_LEVEL_MAX: i64 = 10;

#[derive(Default, Deserialize)]
pub struct PatientRequest {
    #[serde(rename = "nome_paciente", default)]
    pub name: Option<String>,
    #[serde(rename = "idade_paciente", default)]
    pub age: Option<i64>,
    #[serde(rename = "nivel_tecnico", default)]
    pub tech_level: Option<i64>,
    #[serde(rename = "tipo_atendimento", default)]
    pub service_mode: Option<String>,
    /// Formatting characters are stripped before validation.
    #[serde(rename = "cpf_paciente", default)]
    pub cpf: Option<String>,
    #[serde(rename = "senha_paciente", default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for PatientRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatientRequest")
            .field("name", &self.name)
            .field("age", &self.age)
            .field("tech_level", &self.tech_level)
            .field("service_mode", &self.service_mode)
            .field("cpf", &self.cpf)
            .finish_non_exhaustive()
    }
}

impl Drop for PatientRequest {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl PatientRequest {
    pub fn clean(&mut self) {
        validation::clean(&mut self.name);
        validation::clean(&mut self.service_mode);
        if let Some(cpf) = self.cpf.as_mut() {
            *cpf = validation::digits_only(cpf);
        }
    }

    /// Validate a registration and hash its password.
    pub fn build_new_patient(&mut self, iterations: u32) -> Result<NewPatient, ValidationError> {
        self.clean();
        let mut problems = Problems::new();

        validation::check_text(
            &mut problems,
            "Patient name",
            self.name.as_deref(),
            NAME_MIN_CHARS,
            NAME_MAX_CHARS,
        );
        validation::check_text(
            &mut problems,
            "Service mode",
            self.service_mode.as_deref(),
            1,
            SERVICE_MODE_MAX_CHARS,
        );
        let age = check_range(&mut problems, "Age", self.age, AGE_MAX, true);
        let tech_level =
            check_range(&mut problems, "Technical level", self.tech_level, TECH_LEVEL_MAX, true);
        check_cpf(&mut problems, self.cpf.as_deref(), true);
        check_password(&mut problems, self.password.as_deref(), true);
        problems.finish()?;

        match (
            self.name.clone(),
            age,
            tech_level,
            self.service_mode.clone(),
            self.cpf.clone(),
            self.password.as_deref(),
        ) {
            (Some(name), Some(age), Some(tech_level), Some(service_mode), Some(cpf), Some(pw)) => {
                Ok(NewPatient {
                    name,
                    age,
                    tech_level,
                    service_mode,
                    cpf,
                    password_digest: hash_password(pw, iterations),
                })
            }
            _ => Err(ValidationError::single("Incomplete patient data")),
        }
    }

    /// Validate a partial update and hash a new password when one is given.
    /// The result is applied onto the stored row later, under the write lock.
    pub fn into_update(&mut self, iterations: u32) -> Result<PatientUpdate, ValidationError> {
        self.clean();
        let mut problems = Problems::new();

        if let Some(name) = self.name.as_deref() {
            validation::check_length(
                &mut problems,
                "Patient name",
                name,
                NAME_MIN_CHARS,
                NAME_MAX_CHARS,
            );
        }
        if let Some(mode) = self.service_mode.as_deref() {
            validation::check_length(
                &mut problems,
                "Service mode",
                mode,
                1,
                SERVICE_MODE_MAX_CHARS,
            );
        }
        let age = check_range(&mut problems, "Age", self.age, AGE_MAX, false);
        let tech_level =
            check_range(&mut problems, "Technical level", self.tech_level, TECH_LEVEL_MAX, false);
        check_cpf(&mut problems, self.cpf.as_deref(), false);
        check_password(&mut problems, self.password.as_deref(), false);
        problems.finish()?;

        Ok(PatientUpdate {
            name: self.name.take(),
            age,
            tech_level,
            service_mode: self.service_mode.take(),
            cpf: self.cpf.take(),
            password_digest: self.password.as_deref().map(|pw| hash_password(pw, iterations)),
        })
    }
}

/// A validated partial update. Absent fields keep their stored value.
pub struct PatientUpdate {
    pub name: Option<String>,
    pub age: Option<u8>,
    pub tech_level: Option<u8>,
    pub service_mode: Option<String>,
    pub cpf: Option<String>,
    pub password_digest: Option<String>,
}

impl std::fmt::Debug for PatientUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatientUpdate")
            .field("name", &self.name)
            .field("age", &self.age)
            .field("tech_level", &self.tech_level)
            .field("service_mode", &self.service_mode)
            .field("cpf", &self.cpf)
            .field("new_password", &self.password_digest.is_some())
            .finish()
    }
}

impl PatientUpdate {
    pub fn apply(&self, existing: &Patient) -> NewPatient {
        NewPatient {
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            age: self.age.unwrap_or(existing.age),
            tech_level: self.tech_level.unwrap_or(existing.tech_level),
            service_mode: self
                .service_mode
                .clone()
                .unwrap_or_else(|| existing.service_mode.clone()),
            cpf: self.cpf.clone().unwrap_or_else(|| existing.cpf.clone()),
            password_digest: self
                .password_digest
                .clone()
                .unwrap_or_else(|| existing.password_digest.clone()),
        }
    }
}

fn check_range(
    problems: &mut Problems,
    label: &str,
    value: Option<i64>,
    max: i64,
    required: bool,
) -> Option<u8> {
    match value {
        None => {
            if required {
                problems.push(format!("{label} is required"));
            }
            None
        }
        Some(v) => match u8::try_from(v) {
            Ok(v) if i64::from(v) <= max => Some(v),
            _ => {
                problems.push(format!("{label} must be between 0 and {max}"));
                None
            }
        },
    }
}

fn check_cpf(problems: &mut Problems, cpf: Option<&str>, required: bool) {
    match cpf {
        None if required => problems.push("CPF is required"),
        None => {}
        Some(cpf) => problems.check(
            validation::is_valid_cpf(cpf),
            "CPF must contain exactly 11 digits",
        ),
    }
}

fn check_password(problems: &mut Problems, password: Option<&str>, required: bool) {
    match password {
        None if required => problems.push("Password is required"),
        None => {}
        Some(pw) => {
            let len = pw.chars().count();
            problems.check(
                (PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len),
                format!(
                    "Password must be between {PASSWORD_MIN_CHARS} and {PASSWORD_MAX_CHARS} characters"
                ),
            );
        }
    }
}

/// `POST /auth/login` body.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "cpf_paciente", default)]
    pub cpf: Option<String>,
    #[serde(rename = "senha_paciente", default)]
    pub password: Option<String>,
}

impl Drop for LoginRequest {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl LoginRequest {
    /// CPF (digits only) and password, or `None` when either is missing.
    pub fn credentials(&self) -> Option<(String, &str)> {
        let cpf = validation::digits_only(self.cpf.as_deref()?);
        let password = self.password.as_deref()?;
        if cpf.is_empty() || password.is_empty() {
            return None;
        }
        Some((cpf, password))
    }
}
