//! Model input table

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One named numeric column of a [`FeatureFrame`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// Ordered dates plus ordered named columns, all of the same length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFrame {
    dates: Vec<NaiveDate>,
    columns: Vec<FeatureColumn>,
}

impl FeatureFrame {
    #[must_use]
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: Vec::new(),
        }
    }

    /// Append a column, replacing any existing column with the same name.
    ///
    /// Returns an error when the column length differs from the row count.
    pub fn insert<S: Into<String>>(&mut self, name: S, values: Vec<f64>) -> crate::Result<()> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(crate::PmcastError::prediction(format!(
                "column '{name}' has {} values, frame has {} rows",
                values.len(),
                self.dates.len()
            )));
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(FeatureColumn { name, values }),
        }
        Ok(())
    }

    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    #[must_use]
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.dates.len()
    }
}
