use anyhow::{anyhow, Result};

/// Record counters are unsigned; SQLite INTEGER is signed 64-bit.
pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("{value} does not fit in a SQLite INTEGER column"))
}

pub fn to_u64(value: i64, column: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("column {column} holds negative value {value}"))
}
