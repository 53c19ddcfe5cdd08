//! Engine type names to normalized type tags.
//!
//! Normalized tags: `int`, `numeric`, `float`, `string`, `boolean`, `date`,
//! `timestamp`, `json`, `binary`. Unknown types pass through lower-cased so
//! schema contracts can still name them.
//!
//! # SQLite Type Affinity Rules
//!
//! SQLite determines type affinity from declared type names:
//! 1. Contains "INT" -> INTEGER affinity
//! 2. Contains "CHAR", "CLOB", or "TEXT" -> TEXT affinity
//! 3. Contains "BLOB" or no type specified -> BLOB affinity
//! 4. Contains "REAL", "FLOA", or "DOUB" -> REAL affinity
//! 5. Otherwise -> NUMERIC affinity

/// Maps a PostgreSQL `information_schema` data type to a normalized tag.
///
/// # Example
/// ```rust
/// use gaya_core::collectors::normalize_postgres_type;
///
/// assert_eq!(normalize_postgres_type("character varying"), "string");
/// assert_eq!(normalize_postgres_type("TIMESTAMP WITH TIME ZONE"), "timestamp");
/// assert_eq!(normalize_postgres_type("tsvector"), "tsvector");
/// ```
pub fn normalize_postgres_type(pg_type: &str) -> String {
    let lower = pg_type.trim().to_lowercase();
    let normalized = match lower.as_str() {
        "integer" | "int" | "int2" | "int4" | "int8" | "bigint" | "smallint" => "int",
        "numeric" | "decimal" | "money" => "numeric",
        "real" | "double precision" | "float4" | "float8" => "float",
        "text" | "varchar" | "character varying" | "char" | "character" | "bpchar" | "uuid"
        | "citext" | "name" => "string",
        "boolean" | "bool" => "boolean",
        "date" => "date",
        "timestamp"
        | "timestamp without time zone"
        | "timestamp with time zone"
        | "timestamptz" => "timestamp",
        "json" | "jsonb" => "json",
        "bytea" => "binary",
        _ => return lower,
    };
    normalized.to_string()
}

/// Maps a declared SQLite column type to a normalized tag.
///
/// Common declared names (`BOOLEAN`, `DATE`, `DATETIME`, `JSON`) are
/// recognized before falling back to affinity rules.
///
/// # Example
/// ```rust
/// use gaya_core::collectors::normalize_sqlite_type;
///
/// assert_eq!(normalize_sqlite_type("VARCHAR(255)"), "string");
/// assert_eq!(normalize_sqlite_type("BIGINT"), "int");
/// assert_eq!(normalize_sqlite_type(""), "binary");
/// ```
pub fn normalize_sqlite_type(sqlite_type: &str) -> String {
    let upper = sqlite_type.trim().to_uppercase();
    let base = upper.split('(').next().unwrap_or_default().trim();

    let normalized = match base {
        "" => "binary",
        "BOOLEAN" | "BOOL" => "boolean",
        "DATE" => "date",
        "DATETIME" | "TIMESTAMP" => "timestamp",
        "JSON" => "json",
        _ if base.contains("INT") => "int",
        _ if base.contains("CHAR") || base.contains("CLOB") || base.contains("TEXT") => "string",
        _ if base.contains("BLOB") => "binary",
        _ if base.contains("REAL") || base.contains("FLOA") || base.contains("DOUB") => "float",
        _ => "numeric",
    };
    normalized.to_string()
}

/// Whether MIN/MAX is collected for a normalized type.
pub fn supports_min_max(normalized_type: &str) -> bool {
    matches!(
        normalized_type,
        "int" | "numeric" | "float" | "date" | "timestamp"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_types() {
        let cases = [
            ("integer", "int"),
            ("bigint", "int"),
            ("numeric", "numeric"),
            ("double precision", "float"),
            ("character varying", "string"),
            ("uuid", "string"),
            ("boolean", "boolean"),
            ("date", "date"),
            ("timestamp without time zone", "timestamp"),
            ("jsonb", "json"),
            ("bytea", "binary"),
            ("USER-DEFINED", "user-defined"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_postgres_type(input), expected, "input {}", input);
        }
    }

    #[test]
    fn test_sqlite_affinity() {
        let cases = [
            ("INTEGER", "int"),
            ("TINYINT", "int"),
            ("NVARCHAR(100)", "string"),
            ("TEXT", "string"),
            ("BLOB", "binary"),
            ("", "binary"),
            ("REAL", "float"),
            ("DOUBLE PRECISION", "float"),
            ("DECIMAL(10,2)", "numeric"),
            ("boolean", "boolean"),
            ("DATETIME", "timestamp"),
            ("date", "date"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_sqlite_type(input), expected, "input {}", input);
        }
    }

    #[test]
    fn test_min_max_support() {
        assert!(supports_min_max("int"));
        assert!(supports_min_max("timestamp"));
        assert!(!supports_min_max("string"));
        assert!(!supports_min_max("boolean"));
    }
}
