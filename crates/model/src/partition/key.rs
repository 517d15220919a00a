use crate::error::KeyError;
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Monthly,
    Yearly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Monthly => "monthly",
            Granularity::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Granularity::Daily),
            "monthly" | "month" => Ok(Granularity::Monthly),
            "yearly" | "year" => Ok(Granularity::Yearly),
            other => Err(KeyError::UnknownGranularity(other.to_string())),
        }
    }
}

/// One scheduling unit. `start` is always the first day of the period, so
/// two keys built from any dates inside the same period compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    granularity: Granularity,
    start: NaiveDate,
}

impl PartitionKey {
    /// The key of the period that contains `date`.
    pub fn containing(granularity: Granularity, date: NaiveDate) -> Self {
        let start = match granularity {
            Granularity::Daily => date,
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
            Granularity::Yearly => date.with_day(1).and_then(|d| d.with_month(1)).unwrap_or(date),
        };
        Self { granularity, start }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    pub fn day(&self) -> u32 {
        self.start.day()
    }

    pub fn next(&self) -> Result<Self, KeyError> {
        let next = match self.granularity {
            Granularity::Daily => self.start.checked_add_days(Days::new(1)),
            Granularity::Monthly => self.start.checked_add_months(Months::new(1)),
            Granularity::Yearly => self.start.checked_add_months(Months::new(12)),
        };
        next.map(|start| Self {
            granularity: self.granularity,
            start,
        })
        .ok_or_else(|| KeyError::Overflow(self.to_string()))
    }

    /// Key without separators, as used in table names (`202001`).
    pub fn compact(&self) -> String {
        let fmt = match self.granularity {
            Granularity::Daily => "%Y%m%d",
            Granularity::Monthly => "%Y%m",
            Granularity::Yearly => "%Y",
        };
        self.start.format(fmt).to_string()
    }

    /// Parse the display form (`2020-01-05`, `2020-01` or `2020`).
    pub fn parse(granularity: Granularity, text: &str) -> Result<Self, KeyError> {
        let text = text.trim();
        let invalid = || KeyError::Invalid(text.to_string());
        let date = match granularity {
            Granularity::Daily => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok(),
            Granularity::Monthly => NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d").ok(),
            Granularity::Yearly => {
                let year: i32 = text.parse().map_err(|_| invalid())?;
                NaiveDate::from_ymd_opt(year, 1, 1)
            }
        }
        .ok_or_else(invalid)?;
        Ok(Self::containing(granularity, date))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.granularity {
            Granularity::Daily => write!(f, "{}", self.start.format("%Y-%m-%d")),
            Granularity::Monthly => write!(f, "{}", self.start.format("%Y-%m")),
            Granularity::Yearly => write!(f, "{}", self.start.format("%Y")),
        }
    }
}
