use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ServiceError;

pub const MSG_ID_NOT_NUMBER: &str = "ID Lisensi harus berupa angka.";
pub const MSG_ID_NOT_POSITIVE: &str = "ID Lisensi harus lebih besar dari 0.";

/// One license entry as stored in the collection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct License {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub no_wa: String,
}

/// Body of `POST /api`. `payload` is kept raw until the action is known.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MutationRequest {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AddLicenseInput {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub no_wa: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeleteLicenseInput {
    #[serde(default)]
    pub id: Value,
}

impl AddLicenseInput {
    pub fn into_license(self) -> Result<License, ServiceError> {
        let id = parse_license_id(&self.id)?;
        Ok(License { id, name: self.name, no_wa: self.no_wa })
    }
}

impl DeleteLicenseInput {
    pub fn id(&self) -> Result<u64, ServiceError> {
        parse_license_id(&self.id)
    }
}

/// Coerce a submitted id into a positive integer.
///
/// Accepts JSON integers, floats without a fractional part (`3.0`) and numeric
/// strings (`" 12 "`). Everything else is a validation error.
pub fn parse_license_id(value: &Value) -> Result<u64, ServiceError> {
    let not_number = || ServiceError::Validation(MSG_ID_NOT_NUMBER.into());
    let not_positive = || ServiceError::Validation(MSG_ID_NOT_POSITIVE.into());

    let n: i128 = match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u as i128
            } else if let Some(i) = n.as_i64() {
                i as i128
            } else {
                let f = n.as_f64().ok_or_else(not_number)?;
                if !f.is_finite() || f.fract() != 0.0 {
                    return Err(not_number());
                }
                if f <= 0.0 {
                    return Err(not_positive());
                }
                if f > u64::MAX as f64 {
                    return Err(not_number());
                }
                f as i128
            }
        }
        Value::String(s) => s.trim().parse::<i128>().map_err(|_| not_number())?,
        _ => return Err(not_number()),
    };

    if n <= 0 {
        return Err(not_positive());
    }
    u64::try_from(n).map_err(|_| not_number())
}
