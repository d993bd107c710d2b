use crate::command::{Command, parse_command};
use crate::db::TransactionStore;
use crate::domain::{AmountError, RecordError, parse_entry};
use crate::locale::Locale;
use crate::report::report_reply;
use crate::telegram::{Messenger, Update};
use crate::window::parse_report_query;
use anyhow::Result;
use chrono::{DateTime, Utc};

pub const HELP_TEXT: &str = "Chào mừng bạn đến với ứng dụng quản lý tài chính cá nhân!

Hướng dẫn sử dụng:

1. Thêm giao dịch:
   Nhập theo cú pháp: <+/-số tiền> <mô tả>.
   Có thể viết tắt: 500k = 500.000, 2tr = 2.000.000.

2. Xem báo cáo:
   - /report hoặc /r: Báo cáo tổng.
   - /report mm/yyyy: Báo cáo tháng.
   - /report dd/mm/yyyy: Báo cáo tuần (hiển thị tuần có ngày được chọn).
   - Thêm \"az\" hoặc \"za\" sau lệnh để sắp xếp theo số tiền:
     Ví dụ: /report az hoặc /report mm/yyyy za.

3. Hủy giao dịch gần nhất:
   - /undo hoặc /u: Xóa giao dịch gần nhất.

4. Xóa toàn bộ dữ liệu:
   - /reset hoặc /x: Xóa tất cả dữ liệu trên bảng tính.";

pub const NO_TRANSACTIONS: &str = "Hiện không có giao dịch nào trong bảng tính.";
pub const NO_READABLE_ROWS: &str = "Không có dữ liệu.";
pub const RESET_DONE: &str = "Đã xóa toàn bộ dữ liệu.";
pub const UNDO_DONE: &str = "Đã xóa giao dịch gần nhất.";
pub const NOTHING_TO_UNDO: &str = "Không có giao dịch nào để xóa.";
pub const SYNTAX_HELP: &str =
    "Lỗi: Nhập đúng cú pháp <+/-số tiền> <mô tả>. Ví dụ: '+500k Lương' hoặc '-200k Mua sắm'.";
pub const AMOUNT_NOT_POSITIVE: &str = "Lỗi: Số tiền phải lớn hơn 0.";
pub const STORE_UNAVAILABLE: &str = "Lỗi: Không thể truy cập bảng tính, vui lòng thử lại sau.";

/// Turns chat lines into store mutations and reply texts.
pub struct Bot<S, L> {
    store: S,
    locale: L,
}

impl<S: TransactionStore, L: Locale> Bot<S, L> {
    pub fn new(store: S, locale: L) -> Self {
        Self { store, locale }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Executes one chat line and returns the reply. Errors are store failures
    /// only; bad user input becomes an instructional reply.
    pub fn reply_to(&mut self, text: &str, now: DateTime<Utc>) -> Result<String> {
        let command = parse_command(text);
        tracing::info!(?command, "handling chat command");
        match command {
            Command::Help => Ok(HELP_TEXT.to_string()),
            Command::Report(args) => self.report(args),
            Command::Reset => self.reset(),
            Command::Undo => self.undo(),
            Command::Record(line) => self.record(line, now),
        }
    }

    /// Webhook entry point: runs the update's text and sends the reply back to
    /// the originating chat. Never fails.
    pub fn handle_update<M: Messenger + ?Sized>(
        &mut self,
        update: &Update,
        messenger: &M,
        now: DateTime<Utc>,
    ) {
        let Some((chat_id, text)) = update.text_message() else {
            tracing::debug!(update_id = ?update.update_id, "ignoring non-text update");
            return;
        };

        let reply = match self.reply_to(text, now) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(chat_id, "store operation failed: {err:#}");
                STORE_UNAVAILABLE.to_string()
            }
        };
        messenger.send(chat_id, &reply);
    }

    fn record(&mut self, line: &str, now: DateTime<Utc>) -> Result<String> {
        let entry = match parse_entry(line) {
            Ok(entry) => entry,
            Err(RecordError::InvalidAmount(AmountError::NotPositive)) => {
                return Ok(AMOUNT_NOT_POSITIVE.to_string());
            }
            Err(err) => {
                tracing::debug!("rejected entry {line:?}: {err}");
                return Ok(SYNTAX_HELP.to_string());
            }
        };

        let tx = entry.at(now);
        self.store.append(&tx)?;
        tracing::info!(kind = %tx.kind, amount = %tx.amount, "recorded transaction");

        Ok(format!(
            "✅ Đã thêm giao dịch:\n💰 Số tiền: {}\n📂 Loại: {}\n📝 Mô tả: {}",
            self.locale.currency(tx.amount),
            tx.kind.label(),
            tx.description
        ))
    }

    fn report(&mut self, args: &str) -> Result<String> {
        if self.store.data_row_count()? == 0 {
            return Ok(NO_TRANSACTIONS.to_string());
        }
        let query = match parse_report_query(args) {
            Ok(query) => query,
            Err(err) => {
                return Ok(format!(
                    "Lỗi: {err}. Dùng mm/yyyy (báo cáo tháng) hoặc dd/mm/yyyy (báo cáo tuần)."
                ));
            }
        };

        let rows = self.store.list_all()?;
        if rows.is_empty() {
            return Ok(NO_READABLE_ROWS.to_string());
        }
        Ok(report_reply(rows, &query, &self.locale))
    }

    fn reset(&mut self) -> Result<String> {
        if self.store.data_row_count()? == 0 {
            return Ok(NO_TRANSACTIONS.to_string());
        }
        self.store.clear()?;
        tracing::info!("store cleared");
        Ok(RESET_DONE.to_string())
    }

    fn undo(&mut self) -> Result<String> {
        if self.store.delete_last()? {
            tracing::info!("last transaction removed");
            Ok(UNDO_DONE.to_string())
        } else {
            Ok(NOTHING_TO_UNDO.to_string())
        }
    }
}
