//! Named-column numeric table handed to prediction pipelines.

use crate::types::Record;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureFrame {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureFrame {
    /// Single-row frame from `(column, value)` pairs.
    pub fn from_row<S: Into<String>>(values: impl IntoIterator<Item = (S, f64)>) -> Self {
        let (columns, row): (Vec<String>, Vec<f64>) =
            values.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self {
            columns,
            rows: vec![row],
        }
    }

    /// Frame built from the columns of `records` whose every value is numeric.
    /// Columns holding text or nulls are left out.
    pub fn from_records(columns: &[String], records: &[Record]) -> Self {
        let mut frame = Self {
            columns: Vec::new(),
            rows: vec![Vec::new(); records.len()],
        };
        for column in columns {
            let values: Option<Vec<f64>> = records
                .iter()
                .map(|record| record.get(column).and_then(serde_json::Value::as_f64))
                .collect();
            if let Some(values) = values {
                frame.push_column(column.clone(), values);
            }
        }
        frame
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Appends a column, replacing any existing column of the same name.
    ///
    /// # Panics
    /// Panics if `values` does not have one entry per row.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) {
        assert_eq!(values.len(), self.rows.len(), "column length mismatch");
        let name = name.into();
        match self.column_index(&name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.columns.push(name);
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Row-major values of `names`, in that order. Returns the first missing
    /// column name on failure.
    pub fn select(&self, names: &[String]) -> Result<Vec<Vec<f64>>, String> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name).ok_or_else(|| name.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i]).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_row_keeps_order() {
        let frame = FeatureFrame::from_row([("BMI", 30.5), ("Age", 40.0)]);
        assert_eq!(frame.columns(), ["BMI", "Age"]);
        assert_eq!(frame.rows(), [vec![30.5, 40.0]]);
    }

    #[test]
    fn test_from_records_skips_non_numeric_columns() {
        let columns = vec!["Name".to_string(), "BMI".to_string(), "Age".to_string()];
        let records = vec![
            record(json!({"Name": "a", "BMI": 30.5, "Age": 40})),
            record(json!({"Name": "b", "BMI": 22.0, "Age": null})),
        ];
        let frame = FeatureFrame::from_records(&columns, &records);
        assert_eq!(frame.columns(), ["BMI"]);
        assert_eq!(frame.column("BMI"), Some(vec![30.5, 22.0]));
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn test_push_and_select() {
        let mut frame = FeatureFrame::from_row([("BMI", 30.5), ("Age", 40.0)]);
        frame.push_column("BMI_Age_Interaction", vec![1220.0]);
        assert!(frame.has_column("BMI_Age_Interaction"));

        let selected = frame
            .select(&["Age".to_string(), "BMI_Age_Interaction".to_string()])
            .unwrap();
        assert_eq!(selected, vec![vec![40.0, 1220.0]]);

        let missing = frame.select(&["Glucose".to_string()]).unwrap_err();
        assert_eq!(missing, "Glucose");
    }

    #[test]
    fn test_push_replaces_existing_column() {
        let mut frame = FeatureFrame::from_row([("Age", 40.0)]);
        frame.push_column("Age", vec![41.0]);
        assert_eq!(frame.columns(), ["Age"]);
        assert_eq!(frame.column("Age"), Some(vec![41.0]));
    }
}
