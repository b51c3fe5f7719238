/// One typed cell as persisted in a journal column. Dates carry epoch
/// milliseconds; malformed or empty cells become `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Long(i64),
    Double(f64),
    Date(i64),
    Str(String),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}
