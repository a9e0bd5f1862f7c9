//! Diagnostics attached to a statement (`SHOW WARNINGS`).

use std::fmt;

use super::error::{is_plan_out_of_range, ExecuteError, ExecuteResult};
use super::result::Row;

/// One diagnostic row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub level: String,
    pub code: u16,
    pub message: String,
}

impl Warning {
    pub fn new(level: impl Into<String>, code: u16, message: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            code,
            message: message.into(),
        }
    }

    /// Decode a `Level | Code | Message` row.
    pub fn from_row(row: &Row) -> ExecuteResult<Self> {
        if row.len() != 3 {
            return Err(ExecuteError::MalformedOutput(format!(
                "warning row should have 3 columns, got {}",
                row.len()
            )));
        }
        let cell = |i: usize| row[i].clone().unwrap_or_default();
        let code = cell(1)
            .trim()
            .parse::<u16>()
            .map_err(|e| ExecuteError::MalformedOutput(format!("warning code: {}", e)))?;
        Ok(Self::new(cell(0), code, cell(2)))
    }

    pub fn is_plan_out_of_range(&self) -> bool {
        is_plan_out_of_range(self.code, &self.message)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.level, self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row() {
        let row = vec![
            Some("Warning".to_string()),
            Some("1105".to_string()),
            Some("The parameter of nth_plan() is out of range".to_string()),
        ];
        let warning = Warning::from_row(&row).unwrap();
        assert_eq!(warning.code, 1105);
        assert!(warning.is_plan_out_of_range());
    }

    #[test]
    fn test_from_row_rejects_bad_shape() {
        let row = vec![Some("Warning".to_string()), Some("x".to_string()), None];
        assert!(Warning::from_row(&row).is_err());
        assert!(Warning::from_row(&vec![None]).is_err());
    }
}
