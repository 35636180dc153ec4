//! Inflation adjustment into a fixed reference year's dollars.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::{self, PipelineError};

/// Reference year of the built-in CPI table.
pub const DEFAULT_REFERENCE_YEAR: i32 = 2019;

/// Oracle mapping an amount in a given year's dollars to reference-year dollars.
pub trait InflationIndex: Send + Sync {
    fn reference_year(&self) -> i32;

    fn inflate(&self, amount: f64, year: i32) -> error::Result<f64>;
}

/// US CPI-U, annual averages (1982-84 = 100).
const CPI_U_ANNUAL: &[(i32, f64)] = &[
    (1913, 9.9),
    (1914, 10.0),
    (1915, 10.1),
    (1916, 10.9),
    (1917, 12.8),
    (1918, 15.1),
    (1919, 17.3),
    (1920, 20.0),
    (1921, 17.9),
    (1922, 16.8),
    (1923, 17.1),
    (1924, 17.1),
    (1925, 17.5),
    (1926, 17.7),
    (1927, 17.4),
    (1928, 17.1),
    (1929, 17.1),
    (1930, 16.7),
    (1931, 15.2),
    (1932, 13.7),
    (1933, 13.0),
    (1934, 13.4),
    (1935, 13.7),
    (1936, 13.9),
    (1937, 14.4),
    (1938, 14.1),
    (1939, 13.9),
    (1940, 14.0),
    (1941, 14.7),
    (1942, 16.3),
    (1943, 17.3),
    (1944, 17.6),
    (1945, 18.0),
    (1946, 19.5),
    (1947, 22.3),
    (1948, 24.1),
    (1949, 23.8),
    (1950, 24.1),
    (1951, 26.0),
    (1952, 26.5),
    (1953, 26.7),
    (1954, 26.9),
    (1955, 26.8),
    (1956, 27.2),
    (1957, 28.1),
    (1958, 28.9),
    (1959, 29.1),
    (1960, 29.6),
    (1961, 29.9),
    (1962, 30.2),
    (1963, 30.6),
    (1964, 31.0),
    (1965, 31.5),
    (1966, 32.4),
    (1967, 33.4),
    (1968, 34.8),
    (1969, 36.7),
    (1970, 38.8),
    (1971, 40.5),
    (1972, 41.8),
    (1973, 44.4),
    (1974, 49.3),
    (1975, 53.8),
    (1976, 56.9),
    (1977, 60.6),
    (1978, 65.2),
    (1979, 72.6),
    (1980, 82.4),
    (1981, 90.9),
    (1982, 96.5),
    (1983, 99.6),
    (1984, 103.9),
    (1985, 107.6),
    (1986, 109.6),
    (1987, 113.6),
    (1988, 118.3),
    (1989, 124.0),
    (1990, 130.7),
    (1991, 136.2),
    (1992, 140.3),
    (1993, 144.5),
    (1994, 148.2),
    (1995, 152.4),
    (1996, 156.9),
    (1997, 160.5),
    (1998, 163.0),
    (1999, 166.6),
    (2000, 172.2),
    (2001, 177.1),
    (2002, 179.9),
    (2003, 184.0),
    (2004, 188.9),
    (2005, 195.3),
    (2006, 201.6),
    (2007, 207.342),
    (2008, 215.303),
    (2009, 214.537),
    (2010, 218.056),
    (2011, 224.939),
    (2012, 229.594),
    (2013, 232.957),
    (2014, 236.736),
    (2015, 237.017),
    (2016, 240.007),
    (2017, 245.120),
    (2018, 251.107),
    (2019, 255.657),
];

/// Year → CPI lookup table.
#[derive(Debug, Clone)]
pub struct CpiTable {
    values: BTreeMap<i32, f64>,
    reference_year: i32,
}

#[derive(Debug, Deserialize)]
struct CpiRow {
    year: i32,
    cpi: f64,
}

impl CpiTable {
    /// The built-in annual CPI-U series in 2019 dollars.
    pub fn builtin() -> Self {
        Self {
            values: CPI_U_ANNUAL.iter().copied().collect(),
            reference_year: DEFAULT_REFERENCE_YEAR,
        }
    }

    /// Load a `year,cpi` CSV (with header). The reference year defaults to
    /// the latest year in the file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("open CPI table {}", path.display()))?;
        let mut values = BTreeMap::new();
        for (line, row) in reader.deserialize::<CpiRow>().enumerate() {
            let row = row.with_context(|| format!("CPI table row {}", line + 2))?;
            if !(row.cpi.is_finite() && row.cpi > 0.0) {
                anyhow::bail!("CPI table row {}: cpi must be positive", line + 2);
            }
            values.insert(row.year, row.cpi);
        }
        let reference_year = *values
            .keys()
            .next_back()
            .ok_or_else(|| anyhow::anyhow!("CPI table {} is empty", path.display()))?;
        Ok(Self {
            values,
            reference_year,
        })
    }

    /// Re-anchor the table on another year. The year must be present.
    pub fn with_reference_year(mut self, year: i32) -> error::Result<Self> {
        if !self.values.contains_key(&year) {
            return Err(PipelineError::IndexGap { year });
        }
        self.reference_year = year;
        Ok(self)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.values.keys().copied()
    }
}

impl InflationIndex for CpiTable {
    fn reference_year(&self) -> i32 {
        self.reference_year
    }

    fn inflate(&self, amount: f64, year: i32) -> error::Result<f64> {
        let base = self
            .values
            .get(&year)
            .ok_or(PipelineError::IndexGap { year })?;
        let target = self
            .values
            .get(&self.reference_year)
            .ok_or(PipelineError::IndexGap {
                year: self.reference_year,
            })?;
        Ok(amount * target / base)
    }
}

/// Stateless wrapper applying the reference-year short circuit.
#[derive(Clone, Copy)]
pub struct InflationAdjuster<'a> {
    index: &'a dyn InflationIndex,
}

impl<'a> InflationAdjuster<'a> {
    pub fn new(index: &'a dyn InflationIndex) -> Self {
        Self { index }
    }

    pub fn reference_year(&self) -> i32 {
        self.index.reference_year()
    }

    /// Amount in reference-year dollars. Reference-year amounts pass through
    /// untouched; other years go through the index and fail with
    /// [`PipelineError::IndexGap`] when it has no data.
    pub fn adjust(&self, amount: u64, year: i32) -> error::Result<f64> {
        let amount = amount as f64;
        if year == self.index.reference_year() {
            return Ok(amount);
        }
        self.index.inflate(amount, year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reference_year_passes_through() {
        let table = CpiTable::builtin();
        let adjuster = InflationAdjuster::new(&table);
        assert_eq!(adjuster.adjust(1_234_567, 2019).unwrap(), 1_234_567.0);
    }

    #[test]
    fn earlier_dollars_grow() {
        let table = CpiTable::builtin();
        let adjuster = InflationAdjuster::new(&table);
        let adjusted = adjuster.adjust(1_000_000, 1999).unwrap();
        let expected = 1_000_000.0 * 255.657 / 166.6;
        assert!((adjusted - expected).abs() < 1e-6);
        assert!(adjusted > 1_000_000.0);
    }

    #[test]
    fn missing_year_is_an_index_gap() {
        let table = CpiTable::builtin();
        let adjuster = InflationAdjuster::new(&table);
        assert_eq!(
            adjuster.adjust(10, 1900),
            Err(PipelineError::IndexGap { year: 1900 })
        );
        assert_eq!(
            adjuster.adjust(10, 2024),
            Err(PipelineError::IndexGap { year: 2024 })
        );
    }

    #[test]
    fn zero_stays_zero() {
        let table = CpiTable::builtin();
        let adjuster = InflationAdjuster::new(&table);
        assert_eq!(adjuster.adjust(0, 1980).unwrap(), 0.0);
    }

    #[test]
    fn reanchoring_requires_a_known_year() {
        let table = CpiTable::builtin().with_reference_year(2000).unwrap();
        assert_eq!(table.reference_year(), 2000);
        let adjusted = InflationAdjuster::new(&table).adjust(100, 2019).unwrap();
        assert!(adjusted < 100.0);
        assert!(CpiTable::builtin().with_reference_year(1850).is_err());
    }

    #[test]
    fn builtin_table_is_contiguous() {
        let years: Vec<i32> = CpiTable::builtin().years().collect();
        assert_eq!(years.first(), Some(&1913));
        assert_eq!(years.last(), Some(&2019));
        assert!(years.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn loads_csv_and_uses_latest_year_as_reference() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "year,cpi").unwrap();
        writeln!(file, "2020, 258.811").unwrap();
        writeln!(file, "2021, 270.970").unwrap();
        writeln!(file, "2019, 255.657").unwrap();
        file.flush().unwrap();

        let table = CpiTable::from_csv_path(file.path()).unwrap();
        assert_eq!(table.reference_year(), 2021);
        let adjusted = table.inflate(100.0, 2019).unwrap();
        assert!((adjusted - 100.0 * 270.970 / 255.657).abs() < 1e-9);
    }

    #[test]
    fn rejects_empty_or_bad_csv() {
        let mut empty = tempfile::NamedTempFile::new().unwrap();
        writeln!(empty, "year,cpi").unwrap();
        empty.flush().unwrap();
        assert!(CpiTable::from_csv_path(empty.path()).is_err());

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "year,cpi").unwrap();
        writeln!(bad, "2019,0").unwrap();
        bad.flush().unwrap();
        assert!(CpiTable::from_csv_path(bad.path()).is_err());
    }
}
