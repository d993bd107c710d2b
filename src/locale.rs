use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Locale data used when rendering replies.
pub trait Locale {
    /// Time zone the user thinks in; report windows are resolved in it too.
    fn offset(&self) -> FixedOffset;

    fn currency(&self, amount: Decimal) -> String;

    fn timestamp(&self, at: DateTime<Utc>) -> String;

    fn date(&self, date: NaiveDate) -> String;

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset()).date_naive()
    }
}

/// vi-VN conventions: `1.250.000 ₫`, `14:05 15/03/2024`, `15/3/2024`.
#[derive(Debug, Clone, Copy)]
pub struct Vietnamese {
    offset: FixedOffset,
}

impl Vietnamese {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Default for Vietnamese {
    fn default() -> Self {
        Self::new(FixedOffset::east_opt(7 * 3600).expect("+07:00 is a valid offset"))
    }
}

impl Locale for Vietnamese {
    fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn currency(&self, amount: Decimal) -> String {
        // đồng has no minor unit
        let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let digits = rounded.abs().trunc().to_string();
        format!("{sign}{}\u{a0}₫", group_thousands(&digits, '.'))
    }

    fn timestamp(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format("%H:%M %d/%m/%Y")
            .to_string()
    }

    fn date(&self, date: NaiveDate) -> String {
        format!("{}/{}/{}", date.day(), date.month(), date.year())
    }
}

fn group_thousands(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}
