use chrono::NaiveDateTime;
use std::fmt;

/// A single scalar in a record. Displayed the way the report prints it.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Empty,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Integer(value) => write!(f, "{value}"),
            // Whole floats keep one decimal so 93.0 does not read as an integer.
            CellValue::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.1}")
            }
            CellValue::Float(value) => write!(f, "{value}"),
            CellValue::Timestamp(value) => write!(f, "{value}"),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Integer(value as i64)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Integer(value as i64)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Timestamp(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

/// Field name to value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Replacing an existing key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

/// Upper-cases the first letter of every word and lower-cases the rest. A
/// word starts after any non-alphabetic character, so "pass/ fail" becomes
/// "Pass/ Fail" and "std dev (uL)" becomes "Std Dev (Ul)".
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn title_case_matches_report_headers() {
        assert_eq!(title_case("report name"), "Report Name");
        assert_eq!(title_case("Pass/ Fail"), "Pass/ Fail");
        assert_eq!(title_case("DFTM Complete"), "Dftm Complete");
        assert_eq!(title_case("std dev (uL)"), "Std Dev (Ul)");
        assert_eq!(title_case("3d view"), "3D View");
    }

    #[test]
    fn insert_keeps_first_position() {
        let mut record = Record::new().with("b", 1).with("a", 2);
        record.insert("b", "replaced");
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(record.get("b"), Some(&CellValue::from("replaced")));
    }

    #[test]
    fn values_display_like_the_report() {
        assert_eq!(CellValue::from(91.900000000000006).to_string(), "91.9");
        assert_eq!(CellValue::from(93.0).to_string(), "93.0");
        assert_eq!(CellValue::from(301).to_string(), "301");
        assert_eq!(CellValue::from(None::<i64>).to_string(), "");
        let stamp = NaiveDate::from_ymd_opt(2019, 2, 1)
            .and_then(|d| d.and_hms_micro_opt(8, 42, 9, 63_747))
            .expect("valid timestamp");
        assert_eq!(
            CellValue::from(stamp).to_string(),
            "2019-02-01 08:42:09.063747"
        );
    }
}
