//! ディスパッチャ — 検証済み Invocation のローカル実行
//!
//! 検証済みの呼び出しをちょうど一度だけ Record Store に対して実行し、
//! ストアの結果・失敗を呼び出し元向けの構造化された Outcome に変換する。
//! リトライは行わない。ストアの失敗はそのターンで終端し、テキストとして
//! 報告される（上位に未捕捉のまま伝播しない）。

use tracing::{debug, warn};

use crate::store::{StoreError, UserRecord, UserStore};

use super::validate::Invocation;

/// 呼び出し元向けのエラー区分
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorKind {
    NotFound,
    DuplicateEmail,
    NoFieldsProvided,
    Internal,
}

/// ディスパッチ結果。成功メッセージまたは型付きエラーのどちらか。
#[derive(Debug)]
pub struct Outcome {
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl Outcome {
    fn success(message: String) -> Self {
        Self {
            kind: None,
            message,
        }
    }

    fn error(kind: ErrorKind, message: String) -> Self {
        Self {
            kind: Some(kind),
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind.is_none()
    }
}

/// 検証済み Invocation をストアに対して実行する。
pub fn dispatch(store: &UserStore, invocation: &Invocation) -> Outcome {
    debug!(action = %invocation.spec.name, "Dispatching validated invocation");

    let outcome = match invocation.spec.name {
        "list_all_users" => list_all_users(store),
        "get_user_details" => get_user_details(store, invocation),
        "add_new_user" => add_new_user(store, invocation),
        "update_user_details" => update_user_details(store, invocation),
        "delete_user" => delete_user(store, invocation),
        other => {
            warn!(action = %other, "Dispatch requested for unknown action");
            Outcome::error(
                ErrorKind::Internal,
                format!("Error: unknown action '{other}'."),
            )
        }
    };

    debug!(
        action = %invocation.spec.name,
        success = outcome.is_success(),
        kind = ?outcome.kind,
        "Dispatch completed"
    );
    outcome
}

/// 検証済み Invocation から必須テキスト引数を取り出す。
/// バリデータを通過している前提のため、欠落は内部エラーとして扱う。
fn required_text<'a>(invocation: &'a Invocation, name: &str) -> Result<&'a str, Outcome> {
    invocation.text_arg(name).ok_or_else(|| {
        warn!(
            action = %invocation.spec.name,
            argument = %name,
            "Required argument missing after validation"
        );
        Outcome::error(
            ErrorKind::Internal,
            format!("Error: internal argument '{name}' was lost before dispatch."),
        )
    })
}

fn format_record(record: &UserRecord) -> String {
    format!("User Details: Name={}, Email={}", record.name, record.email)
}

fn not_found(name: &str) -> Outcome {
    Outcome::error(
        ErrorKind::NotFound,
        format!("No user found with the name '{name}'."),
    )
}

fn duplicate_email(email: &str) -> Outcome {
    Outcome::error(
        ErrorKind::DuplicateEmail,
        format!("Error: A user with the email '{email}' already exists."),
    )
}

fn store_failure(e: StoreError) -> Outcome {
    warn!(error = %e, "Store operation failed");
    Outcome::error(
        ErrorKind::Internal,
        format!("Error: the database operation failed: {e}."),
    )
}

fn list_all_users(store: &UserStore) -> Outcome {
    match store.list() {
        Ok(users) if users.is_empty() => {
            Outcome::success("There are no users in the database.".to_string())
        }
        Ok(users) => {
            let lines: Vec<String> = users
                .iter()
                .map(|u| format!("- {} ({})", u.name, u.email))
                .collect();
            Outcome::success(lines.join("\n"))
        }
        Err(e) => store_failure(e),
    }
}

fn get_user_details(store: &UserStore, invocation: &Invocation) -> Outcome {
    let name = match required_text(invocation, "name") {
        Ok(n) => n,
        Err(outcome) => return outcome,
    };

    // 参照系ルックアップは部分一致。update / delete の完全一致とは意図的に異なる。
    match store.find(name) {
        Ok(Some(record)) => Outcome::success(format_record(&record)),
        Ok(None) => not_found(name),
        Err(e) => store_failure(e),
    }
}

fn add_new_user(store: &UserStore, invocation: &Invocation) -> Outcome {
    let name = match required_text(invocation, "name") {
        Ok(n) => n,
        Err(outcome) => return outcome,
    };
    let email = match required_text(invocation, "email") {
        Ok(e) => e,
        Err(outcome) => return outcome,
    };

    match store.insert(name, email) {
        Ok(record) => Outcome::success(format!(
            "User '{}' was successfully added to the database.",
            record.name
        )),
        Err(StoreError::DuplicateEmail { email }) => duplicate_email(&email),
        Err(e) => store_failure(e),
    }
}

fn update_user_details(store: &UserStore, invocation: &Invocation) -> Outcome {
    let name = match required_text(invocation, "name") {
        Ok(n) => n,
        Err(outcome) => return outcome,
    };
    let new_name = invocation.text_arg("new_name");
    let new_email = invocation.text_arg("new_email");

    match store.update(name, new_name, new_email) {
        Ok(record) => Outcome::success(format!(
            "User '{name}' was successfully updated. {}",
            format_record(&record)
        )),
        Err(StoreError::NotFound { name }) => not_found(&name),
        Err(StoreError::DuplicateEmail { email }) => duplicate_email(&email),
        Err(StoreError::NoFieldsProvided) => Outcome::error(
            ErrorKind::NoFieldsProvided,
            "Error: no fields were provided to update.".to_string(),
        ),
        Err(e) => store_failure(e),
    }
}

fn delete_user(store: &UserStore, invocation: &Invocation) -> Outcome {
    let name = match required_text(invocation, "name") {
        Ok(n) => n,
        Err(outcome) => return outcome,
    };

    match store.delete(name) {
        Ok(()) => Outcome::success(format!(
            "User '{name}' was successfully deleted from the database."
        )),
        Err(StoreError::NotFound { name }) => not_found(&name),
        Err(e) => store_failure(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::registry;
    use crate::agent::tools::validate::validate;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, UserStore) {
        let tmp = TempDir::new().unwrap();
        let store = UserStore::open_at(tmp.path().join("users.db")).unwrap();
        (tmp, store)
    }

    fn invoke(store: &UserStore, action: &str, raw_args: &str) -> Outcome {
        let spec = registry::get(action).unwrap();
        let invocation = validate(spec, raw_args).unwrap();
        dispatch(store, &invocation)
    }

    #[test]
    fn list_formats_seeded_users() {
        let (_tmp, store) = open_store();
        let outcome = invoke(&store, "list_all_users", "{}");

        assert!(outcome.is_success());
        assert_eq!(
            outcome.message,
            "- Alice (alice@wonderland.io)\n- Charlie (charlie@factory.com)"
        );
    }

    #[test]
    fn list_reports_empty_database() {
        let (_tmp, store) = open_store();
        store.delete("Alice").unwrap();
        store.delete("Charlie").unwrap();

        let outcome = invoke(&store, "list_all_users", "{}");
        assert_eq!(outcome.message, "There are no users in the database.");
    }

    #[test]
    fn get_matches_by_substring() {
        let (_tmp, store) = open_store();
        let outcome = invoke(&store, "get_user_details", r#"{"name": "Ali"}"#);

        assert!(outcome.is_success());
        assert_eq!(
            outcome.message,
            "User Details: Name=Alice, Email=alice@wonderland.io"
        );
    }

    #[test]
    fn get_reports_not_found() {
        let (_tmp, store) = open_store();
        let outcome = invoke(&store, "get_user_details", r#"{"name": "Nobody"}"#);

        assert_eq!(outcome.kind, Some(ErrorKind::NotFound));
        assert_eq!(outcome.message, "No user found with the name 'Nobody'.");
    }

    #[test]
    fn add_inserts_and_reports_success() {
        let (_tmp, store) = open_store();
        let outcome = invoke(
            &store,
            "add_new_user",
            r#"{"name": "Bob", "email": "bob@builder.dev"}"#,
        );

        assert!(outcome.is_success());
        assert_eq!(
            outcome.message,
            "User 'Bob' was successfully added to the database."
        );
        assert_eq!(store.list().unwrap().len(), 3);
    }

    #[test]
    fn add_duplicate_email_reports_error_verbatim() {
        let (_tmp, store) = open_store();
        let outcome = invoke(
            &store,
            "add_new_user",
            r#"{"name": "Mallory", "email": "alice@wonderland.io"}"#,
        );

        assert_eq!(outcome.kind, Some(ErrorKind::DuplicateEmail));
        assert_eq!(
            outcome.message,
            "Error: A user with the email 'alice@wonderland.io' already exists."
        );
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn update_targets_by_exact_name() {
        let (_tmp, store) = open_store();
        // 部分一致なら Alice にヒットするが、update は完全一致のみ
        let outcome = invoke(
            &store,
            "update_user_details",
            r#"{"name": "Ali", "new_email": "a@b.com"}"#,
        );

        assert_eq!(outcome.kind, Some(ErrorKind::NotFound));
    }

    #[test]
    fn update_changes_email() {
        let (_tmp, store) = open_store();
        let outcome = invoke(
            &store,
            "update_user_details",
            r#"{"name": "Alice", "new_email": "alice@updated.io"}"#,
        );

        assert!(outcome.is_success());
        assert_eq!(
            store.find_exact("Alice").unwrap().unwrap().email,
            "alice@updated.io"
        );
    }

    #[test]
    fn delete_removes_and_reports() {
        let (_tmp, store) = open_store();
        let outcome = invoke(&store, "delete_user", r#"{"name": "Charlie"}"#);

        assert!(outcome.is_success());
        assert_eq!(
            outcome.message,
            "User 'Charlie' was successfully deleted from the database."
        );
        assert!(store.find_exact("Charlie").unwrap().is_none());
    }

    #[test]
    fn delete_unknown_reports_not_found() {
        let (_tmp, store) = open_store();
        let outcome = invoke(&store, "delete_user", r#"{"name": "Nobody"}"#);

        assert_eq!(outcome.kind, Some(ErrorKind::NotFound));
        assert_eq!(store.list().unwrap().len(), 2);
    }
}
