use crate::domain::{Kind, Transaction};
use crate::locale::Locale;
use crate::window::{ReportQuery, ReportWindow, SortOrder};
use rust_decimal::Decimal;

/// Rows of one report, split by kind, in the order they will be listed.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub income: Vec<Transaction>,
    pub expense: Vec<Transaction>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.income.is_empty() && self.expense.is_empty()
    }

    pub fn balance(&self) -> Decimal {
        self.income_total - self.expense_total
    }
}

/// Filters rows to the query window, applies the optional amount sort, then
/// partitions by kind. The sort is stable so equal amounts keep store order.
pub fn summarize(rows: Vec<Transaction>, query: &ReportQuery, locale: &dyn Locale) -> Summary {
    let mut rows: Vec<Transaction> = rows
        .into_iter()
        .filter(|tx| query.window.contains(locale.local_date(tx.timestamp)))
        .collect();

    match query.sort {
        Some(SortOrder::Ascending) => rows.sort_by(|a, b| a.amount.cmp(&b.amount)),
        Some(SortOrder::Descending) => rows.sort_by(|a, b| b.amount.cmp(&a.amount)),
        None => {}
    }

    let mut summary = Summary {
        income_total: Decimal::ZERO,
        expense_total: Decimal::ZERO,
        income: Vec::new(),
        expense: Vec::new(),
    };
    for tx in rows {
        match tx.kind {
            Kind::Income => {
                summary.income_total += tx.amount;
                summary.income.push(tx);
            }
            Kind::Expense => {
                summary.expense_total += tx.amount;
                summary.expense.push(tx);
            }
        }
    }
    summary
}

pub fn window_title(window: &ReportWindow, locale: &dyn Locale) -> String {
    match window {
        ReportWindow::All => "Tổng".to_string(),
        ReportWindow::Month { year, month } => format!("tháng {month:02}/{year}"),
        ReportWindow::Week { start, end } => {
            format!("tuần từ {} đến {}", locale.date(*start), locale.date(*end))
        }
    }
}

pub fn empty_window_message(window: &ReportWindow) -> String {
    let range = match window {
        ReportWindow::Week { .. } => "tuần",
        ReportWindow::Month { .. } => "tháng",
        ReportWindow::All => "khoảng thời gian",
    };
    format!("Không có giao dịch cho {range} được yêu cầu.")
}

fn render_lines(out: &mut Vec<String>, txs: &[Transaction], empty: &str, locale: &dyn Locale) {
    if txs.is_empty() {
        out.push(empty.to_string());
        return;
    }
    for (i, tx) in txs.iter().enumerate() {
        out.push(format!(
            "{}. {}: {} ({})",
            i + 1,
            locale.currency(tx.amount),
            tx.description,
            locale.timestamp(tx.timestamp)
        ));
    }
}

pub fn render(summary: &Summary, window: &ReportWindow, locale: &dyn Locale) -> String {
    let mut out = vec![
        format!("📊 Báo cáo ({}):", window_title(window, locale)),
        format!("- Tổng thu: {}", locale.currency(summary.income_total)),
        format!("- Tổng chi: {}", locale.currency(summary.expense_total)),
        format!("- Cân đối: {}", locale.currency(summary.balance())),
        String::new(),
        "💰 Giao dịch thu nhập cụ thể:".to_string(),
    ];
    render_lines(&mut out, &summary.income, "Không có giao dịch thu nhập.", locale);
    out.push(String::new());
    out.push("💸 Giao dịch chi tiêu cụ thể:".to_string());
    render_lines(&mut out, &summary.expense, "Không có giao dịch chi tiêu.", locale);
    out.join("\n")
}

/// Full reply text for a report over `rows`; `rows` must be the non-empty
/// data of the store.
pub fn report_reply(rows: Vec<Transaction>, query: &ReportQuery, locale: &dyn Locale) -> String {
    let summary = summarize(rows, query, locale);
    if summary.is_empty() {
        return empty_window_message(&query.window);
    }
    render(&summary, &query.window, locale)
}
