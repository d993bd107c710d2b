use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}/\d{2}/\d{4}|\d{2}/\d{4}").expect("date token pattern is valid")
});

/// Time range a report is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportWindow {
    All,
    Month { year: i32, month: u32 },
    /// Monday through Sunday, both inclusive.
    Week { start: NaiveDate, end: NaiveDate },
}

impl ReportWindow {
    pub fn week_of(anchor: NaiveDate) -> Self {
        let start = anchor - Days::new(u64::from(anchor.weekday().num_days_from_monday()));
        let end = start + Days::new(6);
        ReportWindow::Week { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            ReportWindow::All => true,
            ReportWindow::Month { year, month } => date.year() == year && date.month() == month,
            ReportWindow::Week { start, end } => start <= date && date <= end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// `az`: smallest amount first.
    Ascending,
    /// `za`: largest amount first.
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportQuery {
    pub window: ReportWindow,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("ngày '{0}' không hợp lệ")]
    InvalidDate(String),
}

/// Reads the optional `mm/yyyy` or `dd/mm/yyyy` token and `az`/`za` sort flag
/// from the arguments of a report command, in any order.
pub fn parse_report_query(args: &str) -> Result<ReportQuery, QueryError> {
    let window = match DATE_TOKEN.find(args) {
        None => ReportWindow::All,
        Some(m) => parse_window_token(m.as_str())?,
    };

    let tokens: Vec<&str> = args.split_whitespace().collect();
    let sort = if tokens.contains(&"az") {
        Some(SortOrder::Ascending)
    } else if tokens.contains(&"za") {
        Some(SortOrder::Descending)
    } else {
        None
    };

    Ok(ReportQuery { window, sort })
}

fn parse_window_token(token: &str) -> Result<ReportWindow, QueryError> {
    let invalid = || QueryError::InvalidDate(token.to_string());
    let parts: Vec<u32> = token
        .split('/')
        .map(|p| p.parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|_| invalid())?;

    match parts.as_slice() {
        [month, year] => {
            let year = i32::try_from(*year).map_err(|_| invalid())?;
            NaiveDate::from_ymd_opt(year, *month, 1).ok_or_else(invalid)?;
            Ok(ReportWindow::Month {
                year,
                month: *month,
            })
        }
        [day, month, year] => {
            let year = i32::try_from(*year).map_err(|_| invalid())?;
            let anchor = NaiveDate::from_ymd_opt(year, *month, *day).ok_or_else(invalid)?;
            Ok(ReportWindow::week_of(anchor))
        }
        _ => Err(invalid()),
    }
}
