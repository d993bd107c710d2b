use crate::config::{AppPaths, store_slug};
use crate::domain::{Kind, NO_DESCRIPTION, Transaction};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};

/// Column titles of the first row of every store.
pub const HEADER: [&str; 4] = ["Thời gian", "Loại", "Số tiền", "Mô tả"];

/// Row-oriented transaction table: a header row followed by data rows in
/// append order.
pub trait TransactionStore {
    /// Number of rows including the header.
    fn row_count(&self) -> Result<usize>;

    fn append(&mut self, tx: &Transaction) -> Result<()>;

    /// All decodable data rows, header excluded, in append order.
    fn list_all(&self) -> Result<Vec<Transaction>>;

    /// Removes the last data row. Returns false when there was none.
    fn delete_last(&mut self) -> Result<bool>;

    /// Drops every row and writes the header back.
    fn clear(&mut self) -> Result<()>;

    fn data_row_count(&self) -> Result<usize> {
        Ok(self.row_count()?.saturating_sub(1))
    }
}

pub fn encode_row(tx: &Transaction) -> [String; 4] {
    [
        tx.timestamp.to_rfc3339(),
        tx.kind.code().to_string(),
        tx.amount.to_string(),
        tx.description.clone(),
    ]
}

pub fn decode_row(cells: &[String; 4]) -> Result<Transaction> {
    let [time, kind, amount, description] = cells;
    let timestamp = DateTime::parse_from_rfc3339(time.trim())
        .with_context(|| format!("Invalid timestamp cell '{time}'"))?
        .with_timezone(&Utc);
    let kind = kind.parse::<Kind>().map_err(|e| anyhow!(e))?;
    let amount = amount
        .trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid amount cell '{amount}'"))?;
    let description = match description.trim() {
        "" => NO_DESCRIPTION.to_string(),
        d => d.to_string(),
    };
    Ok(Transaction {
        timestamp,
        kind,
        amount,
        description,
    })
}

fn decode_rows(rows: impl IntoIterator<Item = (i64, [String; 4])>) -> Vec<Transaction> {
    let mut out = Vec::new();
    for (row_num, cells) in rows {
        match decode_row(&cells) {
            Ok(tx) => out.push(tx),
            Err(err) => tracing::warn!(row_num, "skipping undecodable row: {err:#}"),
        }
    }
    out
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the store file for `store_id` under the data dir.
    pub fn open(paths: &AppPaths, store_id: &str) -> Result<(Self, PathBuf)> {
        let dir = paths.data_dir.join("stores");
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create store dir {}", dir.display()))?;

        let db_path = dir.join(format!("{}.sqlite3", store_slug(store_id)));
        let store = Self::open_at(&db_path)?;
        Ok((store, db_path))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store {}", path.display()))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sheet_rows (
                row_num INTEGER PRIMARY KEY AUTOINCREMENT,
                time TEXT NOT NULL,
                kind TEXT NOT NULL,
                amount TEXT NOT NULL,
                description TEXT NOT NULL
            );
            "#,
        )?;

        if self.row_count()? == 0 {
            self.insert_cells(&HEADER.map(str::to_string))?;
        }
        Ok(())
    }

    fn insert_cells(&self, cells: &[String; 4]) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sheet_rows (time, kind, amount, description) VALUES (?1, ?2, ?3, ?4)",
            params![cells[0], cells[1], cells[2], cells[3]],
        )?;
        Ok(())
    }
}

impl TransactionStore for SqliteStore {
    fn row_count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sheet_rows", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn append(&mut self, tx: &Transaction) -> Result<()> {
        self.insert_cells(&encode_row(tx))
    }

    fn list_all(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT row_num, time, kind, amount, description FROM sheet_rows ORDER BY row_num ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let row_num: i64 = row.get(0)?;
            let cells: [String; 4] = [row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?];
            Ok((row_num, cells))
        })?;

        let mut raw = Vec::new();
        for row in rows {
            raw.push(row?);
        }
        // first row is the header
        Ok(decode_rows(raw.into_iter().skip(1)))
    }

    fn delete_last(&mut self) -> Result<bool> {
        if self.row_count()? <= 1 {
            return Ok(false);
        }
        let last: Option<i64> = self
            .conn
            .query_row("SELECT MAX(row_num) FROM sheet_rows", [], |row| {
                row.get::<_, Option<i64>>(0)
            })
            .optional()?
            .flatten();
        let Some(last) = last else {
            return Ok(false);
        };
        let changed = self
            .conn
            .execute("DELETE FROM sheet_rows WHERE row_num = ?1", params![last])?;
        Ok(changed == 1)
    }

    fn clear(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM sheet_rows", [])?;
        tx.execute(
            "INSERT INTO sheet_rows (time, kind, amount, description) VALUES (?1, ?2, ?3, ?4)",
            params![HEADER[0], HEADER[1], HEADER[2], HEADER[3]],
        )?;
        tx.commit()?;
        Ok(())
    }
}

/// Store kept entirely in memory.
#[cfg(test)]
pub struct MemoryStore {
    rows: Vec<[String; 4]>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rows: vec![HEADER.map(str::to_string)],
        }
    }

    pub fn with(txs: &[Transaction]) -> Self {
        let mut store = Self::new();
        for tx in txs {
            store.rows.push(encode_row(tx));
        }
        store
    }

    pub fn push_raw(&mut self, cells: [&str; 4]) {
        self.rows.push(cells.map(str::to_string));
    }

    pub fn header(&self) -> Option<&[String; 4]> {
        self.rows.first()
    }
}

#[cfg(test)]
impl TransactionStore for MemoryStore {
    fn row_count(&self) -> Result<usize> {
        Ok(self.rows.len())
    }

    fn append(&mut self, tx: &Transaction) -> Result<()> {
        self.rows.push(encode_row(tx));
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Transaction>> {
        Ok(decode_rows(
            self.rows
                .iter()
                .cloned()
                .enumerate()
                .skip(1)
                .map(|(i, cells)| (i as i64 + 1, cells)),
        ))
    }

    fn delete_last(&mut self) -> Result<bool> {
        if self.rows.len() <= 1 {
            return Ok(false);
        }
        self.rows.pop();
        Ok(true)
    }

    fn clear(&mut self) -> Result<()> {
        self.rows.clear();
        self.rows.push(HEADER.map(str::to_string));
        Ok(())
    }
}
