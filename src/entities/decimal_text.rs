use rust_decimal::Decimal;
use sea_orm::sea_query::{ArrayType, ColumnType, Nullable, StringLen, ValueType, ValueTypeErr};
use sea_orm::{ColIdx, DbErr, QueryResult, TryGetError, TryGetable, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A decimal stored as its canonical text.
///
/// SQLite hands numeric columns back as `f64`, so money columns keep the
/// decimal's string form instead and read back exactly what was written.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DecimalText(pub Decimal);

impl DecimalText {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn into_inner(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for DecimalText {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<DecimalText> for Decimal {
    fn from(value: DecimalText) -> Self {
        value.0
    }
}

impl PartialEq<Decimal> for DecimalText {
    fn eq(&self, other: &Decimal) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for DecimalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.normalize().fmt(f)
    }
}

impl FromStr for DecimalText {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str_exact(s.trim()).map(Self)
    }
}

impl From<DecimalText> for Value {
    fn from(value: DecimalText) -> Self {
        value.to_string().into()
    }
}

impl TryGetable for DecimalText {
    fn try_get_by<I: ColIdx>(res: &QueryResult, idx: I) -> Result<Self, TryGetError> {
        let text = String::try_get_by(res, idx)?;
        text.parse().map_err(|err| {
            TryGetError::DbErr(DbErr::Type(format!("invalid decimal {:?}: {}", text, err)))
        })
    }
}

impl ValueType for DecimalText {
    fn try_from(v: Value) -> Result<Self, ValueTypeErr> {
        let text = <String as ValueType>::try_from(v)?;
        text.parse().map_err(|_| ValueTypeErr)
    }

    fn type_name() -> String {
        "DecimalText".to_owned()
    }

    fn array_type() -> ArrayType {
        ArrayType::String
    }

    fn column_type() -> ColumnType {
        ColumnType::String(StringLen::N(40))
    }
}

impl Nullable for DecimalText {
    fn null() -> Value {
        Value::String(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn writes_the_normalized_decimal_as_text() {
        let value: Value = DecimalText(dec!(33.33330000)).into();
        assert_eq!(value, Value::String(Some(Box::new("33.3333".to_owned()))));
    }

    #[test]
    fn reads_back_the_exact_value() {
        let value = Value::String(Some(Box::new("33.3334".to_owned())));
        let parsed = <DecimalText as ValueType>::try_from(value).unwrap();
        assert_eq!(parsed, dec!(33.3334));
    }

    #[test]
    fn rejects_text_that_is_not_a_decimal() {
        assert!("12,50".parse::<DecimalText>().is_err());
        assert!(<DecimalText as ValueType>::try_from(Value::String(Some(Box::new(
            "abc".to_owned()
        ))))
        .is_err());
    }

    #[test]
    fn serializes_like_a_plain_decimal() {
        let json = serde_json::to_value(DecimalText(dec!(24))).unwrap();
        assert_eq!(json, serde_json::to_value(dec!(24)).unwrap());
    }
}
