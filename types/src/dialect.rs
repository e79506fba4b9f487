//! Unified SQL dialect enum.

use core::fmt;

/// SQL dialect driving database-specific rendering.
///
/// Each dialect has different cast syntax, JSON extraction casts, and
/// function name mappings. The SQLite family is split in two: a minimal
/// profile for old or stripped-down builds, and a 3.44+ profile that can use
/// the newer function surface (`STRING_AGG`, `UNIXEPOCH`).
///
/// # Examples
///
/// ```
/// use jsonsql_types::Dialect;
///
/// assert_eq!(Dialect::parse("postgresql"), Some(Dialect::PostgreSql));
/// assert_eq!(Dialect::parse("sqlite-minimal"), Some(Dialect::SqliteMinimal));
/// assert!(Dialect::PostgreSql.is_postgres());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dialect {
    /// PostgreSQL.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "postgresql"))]
    PostgreSql,

    /// SQLite without any extension assumptions.
    #[cfg_attr(feature = "serde", serde(rename = "sqlite-minimal"))]
    SqliteMinimal,

    /// SQLite 3.44+ with the extended built-in function surface.
    #[cfg_attr(feature = "serde", serde(rename = "sqlite-3.44-extensions"))]
    Sqlite344Extensions,
}

impl Dialect {
    /// Parse a dialect from its config string (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use jsonsql_types::Dialect;
    ///
    /// assert_eq!(Dialect::parse("sqlite-3.44-extensions"), Some(Dialect::Sqlite344Extensions));
    /// assert_eq!(Dialect::parse("mysql"), None);
    /// ```
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("postgresql") {
            Some(Dialect::PostgreSql)
        } else if s.eq_ignore_ascii_case("sqlite-minimal") {
            Some(Dialect::SqliteMinimal)
        } else if s.eq_ignore_ascii_case("sqlite-3.44-extensions") {
            Some(Dialect::Sqlite344Extensions)
        } else {
            None
        }
    }

    /// The canonical config string for this dialect.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Dialect::PostgreSql => "postgresql",
            Dialect::SqliteMinimal => "sqlite-minimal",
            Dialect::Sqlite344Extensions => "sqlite-3.44-extensions",
        }
    }

    /// Returns `true` for the PostgreSQL dialect.
    #[inline]
    #[must_use]
    pub const fn is_postgres(&self) -> bool {
        matches!(self, Dialect::PostgreSql)
    }

    /// Returns `true` for either SQLite profile.
    #[inline]
    #[must_use]
    pub const fn is_sqlite(&self) -> bool {
        matches!(self, Dialect::SqliteMinimal | Dialect::Sqlite344Extensions)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
