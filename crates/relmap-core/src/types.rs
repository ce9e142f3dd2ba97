//! SQL type descriptors.

/// SQL data types carried by column mappings and result-set metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlType {
    SmallInt,
    Integer,
    BigInt,
    Double,
    Numeric { precision: u8, scale: u8 },
    Boolean,
    Char(u32),
    VarChar(u32),
    Text,
    Blob,
    Date,
    Timestamp,
    Uuid,
    Json,
    /// Database-specific type name passed through verbatim.
    Custom(&'static str),
}

impl SqlType {
    /// Get the SQL type name for this type.
    pub fn sql_name(&self) -> String {
        match self {
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            SqlType::Numeric { precision, scale } => format!("NUMERIC({}, {})", precision, scale),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Char(len) => format!("CHAR({})", len),
            SqlType::VarChar(len) => format!("VARCHAR({})", len),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Blob => "BLOB".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Uuid => "UUID".to_string(),
            SqlType::Json => "JSON".to_string(),
            SqlType::Custom(name) => (*name).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_names() {
        assert_eq!(SqlType::BigInt.sql_name(), "BIGINT");
        assert_eq!(SqlType::VarChar(40).sql_name(), "VARCHAR(40)");
        assert_eq!(
            SqlType::Numeric {
                precision: 10,
                scale: 2
            }
            .sql_name(),
            "NUMERIC(10, 2)"
        );
        assert_eq!(SqlType::Custom("CITEXT").sql_name(), "CITEXT");
    }
}
