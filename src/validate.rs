use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{FunnelError, Result};
use crate::loader::RawTable;
use crate::models::{Dataset, Record};

pub const REQUIRED_COLUMNS: [&str; 9] = [
    "date",
    "channel",
    "visits",
    "signup",
    "add_to_cart",
    "checkout",
    "purchase",
    "spend",
    "revenue",
];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %b %Y", "%b %d, %Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Required columns absent from `columns`, sorted by name.
pub fn missing_columns(columns: &[String]) -> Vec<String> {
    let present: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
    REQUIRED_COLUMNS
        .iter()
        .filter(|name| !present.contains(*name))
        .map(|name| name.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(stamp.date());
        }
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(stamp.date_naive());
    }
    Err(FunnelError::DateParse {
        value: value.to_string(),
    })
}

fn parse_count(column: &'static str, row: usize, value: &str) -> Result<u64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if let Ok(count) = trimmed.parse::<u64>() {
        return Ok(count);
    }
    match trimmed.parse::<f64>() {
        Ok(float) if float >= 0.0 && float.fract() == 0.0 && float <= u64::MAX as f64 => {
            Ok(float as u64)
        }
        _ => Err(FunnelError::NumberParse {
            column,
            row,
            value: value.to_string(),
        }),
    }
}

fn parse_amount(column: &'static str, row: usize, value: &str) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
        .ok_or_else(|| FunnelError::NumberParse {
            column,
            row,
            value: value.to_string(),
        })
}

struct Columns {
    date: usize,
    channel: usize,
    visits: usize,
    signup: usize,
    add_to_cart: usize,
    checkout: usize,
    purchase: usize,
    spend: usize,
    revenue: usize,
}

impl Columns {
    fn locate(table: &RawTable) -> Result<Self> {
        let missing = missing_columns(&table.columns);
        if !missing.is_empty() {
            return Err(FunnelError::MissingColumns { missing });
        }
        let index = |name: &str| table.column_index(name).unwrap_or_default();
        Ok(Self {
            date: index("date"),
            channel: index("channel"),
            visits: index("visits"),
            signup: index("signup"),
            add_to_cart: index("add_to_cart"),
            checkout: index("checkout"),
            purchase: index("purchase"),
            spend: index("spend"),
            revenue: index("revenue"),
        })
    }
}

/// Checks the required columns and coerces every row into a typed `Record`.
pub fn validate(table: &RawTable) -> Result<Dataset> {
    let cols = Columns::locate(table)?;
    let mut records = Vec::with_capacity(table.rows.len());

    for (i, row) in table.rows.iter().enumerate() {
        let line = i + 1;
        let cell = |idx: usize| row.get(idx).unwrap_or("");
        records.push(Record {
            date: parse_date(cell(cols.date))?,
            channel: cell(cols.channel).to_string(),
            visits: parse_count("visits", line, cell(cols.visits))?,
            signup: parse_count("signup", line, cell(cols.signup))?,
            add_to_cart: parse_count("add_to_cart", line, cell(cols.add_to_cart))?,
            checkout: parse_count("checkout", line, cell(cols.checkout))?,
            purchase: parse_count("purchase", line, cell(cols.purchase))?,
            spend: parse_amount("spend", line, cell(cols.spend))?,
            revenue: parse_amount("revenue", line, cell(cols.revenue))?,
        });
    }

    Ok(Dataset::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_reader;

    const HEADER: &str = "date,channel,visits,signup,add_to_cart,checkout,purchase,spend,revenue";

    #[test]
    fn reports_sorted_missing_columns() {
        let table = load_reader("revenue,date,channel,visits\n".as_bytes()).unwrap();
        let missing = missing_columns(&table.columns);
        assert_eq!(
            missing,
            vec!["add_to_cart", "checkout", "purchase", "signup", "spend"]
        );
    }

    #[test]
    fn missing_revenue_halts() {
        let csv = "date,channel,visits,signup,add_to_cart,checkout,purchase,spend\n\
                   2024-01-01,X,100,50,20,10,5,100\n";
        let table = load_reader(csv.as_bytes()).unwrap();
        match validate(&table) {
            Err(FunnelError::MissingColumns { missing }) => assert_eq!(missing, vec!["revenue"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn coerces_typed_records() {
        let csv = format!(
            "{HEADER},notes\n2024-03-05, Email ,100,40,20,10.0,5,99.5,250,hello\n"
        );
        let dataset = validate(&load_reader(csv.as_bytes()).unwrap()).unwrap();
        let record = &dataset.records[0];
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(record.channel, " Email ");
        assert_eq!(record.checkout, 10);
        assert_eq!(record.spend, 99.5);
        assert_eq!(record.revenue, 250.0);
    }

    #[test]
    fn accepts_common_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        for value in [
            "2024-01-09",
            "2024/01/09",
            "01/09/2024",
            "9 Jan 2024",
            "Jan 9, 2024",
            "2024-01-09 13:45:00",
            "2024-01-09T13:45:00.250",
            "2024-01-09T13:45:00Z",
        ] {
            assert_eq!(parse_date(value).unwrap(), expected, "{value}");
        }
    }

    #[test]
    fn unparsable_date_carries_value() {
        let csv = format!("{HEADER}\nyesterday,X,1,1,1,1,1,1,1\n");
        match validate(&load_reader(csv.as_bytes()).unwrap()) {
            Err(FunnelError::DateParse { value }) => assert_eq!(value, "yesterday"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_counts() {
        let csv = format!("{HEADER}\n2024-01-01,X,1,1,1,1,-3,1,1\n");
        match validate(&load_reader(csv.as_bytes()).unwrap()) {
            Err(FunnelError::NumberParse { column, row, value }) => {
                assert_eq!(column, "purchase");
                assert_eq!(row, 1);
                assert_eq!(value, "-3");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_amounts() {
        let csv = format!("{HEADER}\n2024-01-01,X,1,1,1,1,1,10,1\n2024-01-02,X,1,1,1,1,1,-0.5,1\n");
        match validate(&load_reader(csv.as_bytes()).unwrap()) {
            Err(FunnelError::NumberParse { column, row, value }) => {
                assert_eq!(column, "spend");
                assert_eq!(row, 2);
                assert_eq!(value, "-0.5");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn blank_numbers_read_as_zero() {
        let csv = format!("{HEADER}\n2024-01-01,X,10,,,,,,\n");
        let dataset = validate(&load_reader(csv.as_bytes()).unwrap()).unwrap();
        assert_eq!(dataset.records[0].signup, 0);
        assert_eq!(dataset.records[0].revenue, 0.0);
    }
}
