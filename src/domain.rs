use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

pub const NO_DESCRIPTION: &str = "Không có mô tả";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    /// Value written to the kind column of the store.
    pub fn code(self) -> &'static str {
        match self {
            Kind::Income => "thu",
            Kind::Expense => "chi",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Kind::Income => "Thu nhập",
            Kind::Expense => "Chi tiêu",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "thu" => Ok(Kind::Income),
            "chi" => Ok(Kind::Expense),
            other => Err(format!("unknown transaction kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: DateTime<Utc>,
    pub kind: Kind,
    /// Always positive; the kind carries the direction.
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Not a positive number once the `tr`/`k` unit markers are removed.
    #[error("amount is not a positive number")]
    Malformed,
    /// Passed validation but the leading numeric part scales to nothing.
    #[error("amount must be greater than zero")]
    NotPositive,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("entry must start with '+' or '-'")]
    InvalidSyntax,
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
}

/// A parsed `<+/-amount> <description>` chat line, not yet timestamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub kind: Kind,
    pub amount: Decimal,
    pub description: String,
}

impl Entry {
    pub fn at(self, timestamp: DateTime<Utc>) -> Transaction {
        Transaction {
            timestamp,
            kind: self.kind,
            amount: self.amount,
            description: self.description,
        }
    }
}

pub fn parse_entry(text: &str) -> Result<Entry, RecordError> {
    let text = text.trim();
    let (raw_amount, rest) = match text.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail),
        None => (text, ""),
    };

    let (kind, unsigned) = if let Some(s) = raw_amount.strip_prefix('+') {
        (Kind::Income, s)
    } else if let Some(s) = raw_amount.strip_prefix('-') {
        (Kind::Expense, s)
    } else {
        return Err(RecordError::InvalidSyntax);
    };

    let amount = parse_amount(unsigned)?;

    let description = rest.trim();
    let description = if description.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        description.to_string()
    };

    Ok(Entry {
        kind,
        amount,
        description,
    })
}

/// Normalizes shorthand amounts: `500k` -> 500000, `2tr` -> 2000000.
///
/// Validation removes the first `tr` and the first `k` and requires the rest to
/// be a positive number. The value itself is the leading numeric prefix of the
/// token, scaled when `tr` (or else `k`) occurs anywhere in it, so `1k2` is 1000.
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountError> {
    let normalized = raw.replacen("tr", "", 1).replacen('k', "", 1);
    match parse_number(&normalized) {
        Some(v) if v > Decimal::ZERO => {}
        _ => return Err(AmountError::Malformed),
    }

    let Some(mut value) = leading_number(raw) else {
        return Err(AmountError::NotPositive);
    };

    let scale = if raw.contains("tr") {
        Some(Decimal::from(1_000_000))
    } else if raw.contains('k') {
        Some(Decimal::from(1_000))
    } else {
        None
    };
    if let Some(scale) = scale {
        value = value.checked_mul(scale).ok_or(AmountError::Malformed)?;
    }

    if value <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    Ok(value.normalize())
}

/// Whole-token grammar for a plain number: optional sign, digits with an
/// optional fraction, optional exponent. ASCII digits only.
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
        .expect("number pattern is valid")
});

/// Same grammar, anchored only at the start.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .expect("leading number pattern is valid")
});

fn parse_number(s: &str) -> Option<Decimal> {
    if !NUMBER.is_match(s) {
        return None;
    }
    to_decimal(s)
}

/// Longest prefix of `s` that reads as a number (`12`, `1.5`, `-3`, `2e3`).
fn leading_number(s: &str) -> Option<Decimal> {
    LEADING_NUMBER.find(s).and_then(|m| to_decimal(m.as_str()))
}

fn to_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim_start_matches('+');
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    let (sign, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits = digits.trim_end_matches('.');
    let mantissa = if digits.starts_with('.') {
        format!("{sign}0{digits}")
    } else {
        format!("{sign}{digits}")
    };
    match exponent {
        Some(exp) => Decimal::from_scientific(&format!("{mantissa}e{exp}")).ok(),
        None => Decimal::from_str(&mantissa).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn unit_suffixes_scale_the_amount() {
        assert_eq!(parse_amount("500k"), Ok(d(500_000)));
        assert_eq!(parse_amount("2tr"), Ok(d(2_000_000)));
        assert_eq!(parse_amount("100"), Ok(d(100)));
        assert_eq!(parse_amount("1.5tr"), Ok(d(1_500_000)));
        assert_eq!(parse_amount("2.5"), Ok(Decimal::new(25, 1)));
    }

    #[test]
    fn zero_and_negative_amounts_are_rejected() {
        assert_eq!(parse_amount("-5"), Err(AmountError::Malformed));
        assert_eq!(parse_amount("0"), Err(AmountError::Malformed));
        assert_eq!(parse_amount("0k"), Err(AmountError::Malformed));
        assert_eq!(parse_amount(""), Err(AmountError::Malformed));
        assert_eq!(parse_amount("abc"), Err(AmountError::Malformed));
        assert_eq!(parse_amount("5kk"), Err(AmountError::Malformed));
    }

    #[test]
    fn suffix_detection_is_unanchored() {
        // numeric parse stops at the first non-digit, then the unit applies
        assert_eq!(parse_amount("1k2"), Ok(d(1_000)));
        assert_eq!(parse_amount("3tr5"), Ok(d(3_000_000)));
        // validates as "5" but has no leading number
        assert_eq!(parse_amount("k5"), Err(AmountError::NotPositive));
    }

    #[test]
    fn digit_separators_are_not_numbers() {
        assert_eq!(parse_amount("1_000"), Err(AmountError::Malformed));
        assert_eq!(parse_amount("5_"), Err(AmountError::Malformed));
        assert_eq!(parse_amount("1_000k"), Err(AmountError::Malformed));
        assert_eq!(parse_amount("2_tr"), Err(AmountError::Malformed));
        assert_eq!(
            parse_entry("-1_000 coffee"),
            Err(RecordError::InvalidAmount(AmountError::Malformed))
        );
    }

    #[test]
    fn only_plain_ascii_decimals_validate() {
        assert_eq!(parse_amount("1,5"), Err(AmountError::Malformed));
        assert_eq!(parse_amount("٣"), Err(AmountError::Malformed));
        assert_eq!(parse_amount("."), Err(AmountError::Malformed));
        assert_eq!(parse_amount(".5k"), Ok(d(500)));
        assert_eq!(parse_amount("5."), Ok(d(5)));
    }

    #[test]
    fn exponent_notation_is_accepted() {
        assert_eq!(parse_amount("2e3"), Ok(d(2_000)));
    }

    #[test]
    fn sign_selects_kind() {
        let income = parse_entry("+500k Lương tháng 3").unwrap();
        assert_eq!(income.kind, Kind::Income);
        assert_eq!(income.amount, d(500_000));
        assert_eq!(income.description, "Lương tháng 3");

        let expense = parse_entry("-2tr Tiền nhà").unwrap();
        assert_eq!(expense.kind, Kind::Expense);
        assert_eq!(expense.amount, d(2_000_000));
    }

    #[test]
    fn missing_description_uses_placeholder() {
        let entry = parse_entry("-50k   ").unwrap();
        assert_eq!(entry.description, NO_DESCRIPTION);
    }

    #[test]
    fn entry_errors_are_classified() {
        assert_eq!(parse_entry("500k Lương"), Err(RecordError::InvalidSyntax));
        assert_eq!(parse_entry("hello"), Err(RecordError::InvalidSyntax));
        assert_eq!(parse_entry(""), Err(RecordError::InvalidSyntax));
        assert_eq!(
            parse_entry("+abc coffee"),
            Err(RecordError::InvalidAmount(AmountError::Malformed))
        );
        assert_eq!(
            parse_entry("--5 coffee"),
            Err(RecordError::InvalidAmount(AmountError::Malformed))
        );
    }

    #[test]
    fn kind_codes_round_trip_through_store_cells() {
        assert_eq!("thu".parse::<Kind>(), Ok(Kind::Income));
        assert_eq!("chi".parse::<Kind>(), Ok(Kind::Expense));
        assert!("other".parse::<Kind>().is_err());
        assert_eq!(Kind::Expense.to_string(), "chi");
    }
}
