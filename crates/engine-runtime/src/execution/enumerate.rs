use chrono::NaiveDate;
use model::{
    error::KeyError,
    partition::{Granularity, PartitionKey},
};

/// Every key at `granularity` from the one containing `start` through the
/// one containing `until`, inclusive and ascending. Empty when `start` is
/// after `until`.
pub fn enumerate(
    start: NaiveDate,
    until: NaiveDate,
    granularity: Granularity,
) -> Result<Vec<PartitionKey>, KeyError> {
    let mut keys = Vec::new();
    if start > until {
        return Ok(keys);
    }

    let last = PartitionKey::containing(granularity, until);
    let mut key = PartitionKey::containing(granularity, start);
    while key <= last {
        keys.push(key);
        if key == last {
            break;
        }
        key = key.next()?;
    }
    Ok(keys)
}
