//! ユーザーレコードの永続化ストア
//!
//! SQLite で `users` テーブルを管理する。email の一意性は
//! UNIQUE 制約で担保し、違反は `StoreError::DuplicateEmail` として返す。
//! コネクションは操作ごとに取得・解放する（ターンをまたいで保持しない）。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info};

/// 初回起動時に投入するシードデータ（テーブルが空の場合のみ）
const SEED_USERS: &[(&str, &str)] = &[
    ("Alice", "alice@wonderland.io"),
    ("Charlie", "charlie@factory.com"),
];

/// ストア操作の型付きエラー
#[derive(Debug, Error)]
pub enum StoreError {
    /// 対象レコードが存在しない（update / delete）
    #[error("no user found with the name '{name}'")]
    NotFound { name: String },
    /// email の一意性違反（insert / update）
    #[error("a user with the email '{email}' already exists")]
    DuplicateEmail { email: String },
    /// update で new_name / new_email の両方が未指定
    #[error("no fields provided to update")]
    NoFieldsProvided,
    /// その他の SQLite エラー
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

/// 1 ユーザー分の永続化レコード
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// ユーザーレコードのストア。
///
/// DB ファイルのパスのみを保持し、各操作で `Connection` を開いて
/// スコープ終了時に閉じる。長命な共有ハンドルは持たない。
pub struct UserStore {
    db_path: PathBuf,
}

impl UserStore {
    /// データディレクトリを決定し、ストアを初期化する。
    pub fn open() -> Result<Self> {
        let data_dir = Self::data_dir()?;
        Self::open_at(data_dir.join("users.db"))
    }

    /// 指定されたパスでストアを初期化する（テスト用にも使用）。
    ///
    /// テーブルが存在しなければ作成し、空であればシードデータを投入する。
    pub fn open_at(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create data directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open database: {}", db_path.display()))?;

        Self::migrate(&conn)?;
        Self::seed(&conn)?;

        Ok(Self { db_path })
    }

    /// データディレクトリのパスを返す。
    /// `directories` クレートを使用してプラットフォームに応じたパスを決定する。
    fn data_dir() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "userdesk").context("failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// DB スキーマのマイグレーションを実行する。
    fn migrate(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id    INTEGER PRIMARY KEY,
                name  TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE
            );",
        )
        .context("failed to create users table")?;

        Ok(())
    }

    /// テーブルが空の場合のみシードデータを投入する。
    fn seed(conn: &Connection) -> Result<()> {
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .context("failed to count users")?;

        if count == 0 {
            for (name, email) in SEED_USERS {
                conn.execute(
                    "INSERT INTO users (name, email) VALUES (?1, ?2)",
                    rusqlite::params![name, email],
                )
                .context("failed to seed users table")?;
            }
            info!(seeded = SEED_USERS.len(), "Database initialized with seed users");
        }

        Ok(())
    }

    /// 操作ごとのコネクションを開く。
    fn conn(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// 全レコードを挿入順で返す。空でもエラーにはならない。
    pub fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, email FROM users ORDER BY id ASC")?;
        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// 名前の部分一致で 1 件検索する（参照系ルックアップ用）。
    pub fn find(&self, name_fragment: &str) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, email FROM users WHERE name LIKE ?1 LIMIT 1")?;
        let pattern = format!("%{name_fragment}%");
        let mut rows = stmt.query_map(rusqlite::params![pattern], Self::row_to_record)?;

        rows.next().transpose().map_err(StoreError::from)
    }

    /// 名前の完全一致で 1 件検索する（update / delete のターゲティング用）。
    pub fn find_exact(&self, name: &str) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, email FROM users WHERE name = ?1 LIMIT 1")?;
        let mut rows = stmt.query_map(rusqlite::params![name], Self::row_to_record)?;

        rows.next().transpose().map_err(StoreError::from)
    }

    /// 新規レコードを挿入する。email が既に存在する場合は `DuplicateEmail`。
    pub fn insert(&self, name: &str, email: &str) -> Result<UserRecord, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (name, email) VALUES (?1, ?2)",
            rusqlite::params![name, email],
        )
        .map_err(|e| Self::map_constraint(e, email))?;

        let id = conn.last_insert_rowid();
        debug!(id, name = %name, "User inserted");

        Ok(UserRecord {
            id,
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    /// 既存レコードを部分更新する。
    ///
    /// - 両方のフィールドが未指定なら `NoFieldsProvided`（ストア到達前にも
    ///   バリデータが同じチェックを行うが、ストア自身の不変条件として保持する）
    /// - `name` の完全一致でターゲットを特定し、存在しなければ `NotFound`
    /// - 新しい email が他レコードと衝突した場合は `DuplicateEmail`
    ///
    /// UPDATE は単一ステートメントで行い、失敗時はストアを変更しない。
    pub fn update(
        &self,
        name: &str,
        new_name: Option<&str>,
        new_email: Option<&str>,
    ) -> Result<UserRecord, StoreError> {
        if new_name.is_none() && new_email.is_none() {
            return Err(StoreError::NoFieldsProvided);
        }

        let conn = self.conn()?;

        // ターゲットの id を先に確定する（名前変更後も同じ行を返せるようにする）
        let id: i64 = conn
            .query_row(
                "SELECT id FROM users WHERE name = ?1 LIMIT 1",
                rusqlite::params![name],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound {
                    name: name.to_string(),
                },
                other => StoreError::Db(other),
            })?;

        // 指定されたフィールドのみ SET 句に積む
        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<rusqlite::types::Value> = Vec::new();

        if let Some(n) = new_name {
            sets.push("name = ?");
            params.push(rusqlite::types::Value::Text(n.to_string()));
        }
        if let Some(e) = new_email {
            sets.push("email = ?");
            params.push(rusqlite::types::Value::Text(e.to_string()));
        }
        params.push(rusqlite::types::Value::Integer(id));

        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        conn.execute(&sql, rusqlite::params_from_iter(params.iter()))
            .map_err(|e| Self::map_constraint(e, new_email.unwrap_or_default()))?;

        debug!(id, name = %name, "User updated");

        conn.query_row(
            "SELECT id, name, email FROM users WHERE id = ?1",
            rusqlite::params![id],
            Self::row_to_record,
        )
        .map_err(StoreError::from)
    }

    /// 名前の完全一致でレコードを削除する。存在しなければ `NotFound`。
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let affected = conn.execute("DELETE FROM users WHERE name = ?1", rusqlite::params![name])?;

        if affected == 0 {
            return Err(StoreError::NotFound {
                name: name.to_string(),
            });
        }

        debug!(name = %name, "User deleted");
        Ok(())
    }

    /// DB の行を UserRecord に変換する。
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<UserRecord> {
        Ok(UserRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
        })
    }

    /// UNIQUE 制約違反を `DuplicateEmail` に変換する。それ以外はそのまま。
    fn map_constraint(e: rusqlite::Error, email: &str) -> StoreError {
        match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::DuplicateEmail {
                    email: email.to_string(),
                }
            }
            other => StoreError::Db(other),
        }
    }

    /// DB ファイルのパスを返す（ログ出力用）。
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
