//! 引数バリデータ
//!
//! 選択されたアクションの生引数バンドルを、スキーマに照らして検証する。
//! 必須引数が欠けている場合は実行をブロックし、欠けている引数名を
//! 明示した確認質問を生成する。部分的な必須引数での呼び出しは決して
//! ディスパッチャに到達しない。

use serde_json::{Map, Value};
use thiserror::Error;

use super::registry::ToolSpec;

/// 検証エラー。いずれもディスパッチ前に回収され、確認質問に変換される。
#[derive(Debug, Error)]
pub enum ValidationError {
    /// 必須引数が欠落している（確認質問で解決する、システム障害ではない）
    #[error("missing required arguments: {}", fields.join(", "))]
    MissingArguments { fields: Vec<&'static str> },
    /// 引数の型・形状がスキーマに適合しない
    #[error("invalid value for argument '{field}' (expected {expected})")]
    InvalidArgument {
        field: &'static str,
        expected: &'static str,
    },
    /// update でオプション引数がひとつも指定されていない
    #[error("no fields provided to update")]
    NoFieldsProvided,
    /// Tool Call の引数が JSON オブジェクトとしてパースできない
    #[error("malformed tool-call arguments: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ValidationError {
    /// 呼び出し元に返す確認質問を生成する。
    /// 謝罪でも推測でもなく、不足している情報を具体的に尋ねる。
    pub fn clarification(&self) -> String {
        match self {
            ValidationError::MissingArguments { fields } => {
                format!(
                    "I need a bit more information before I can do that. Please provide: {}.",
                    fields.join(", ")
                )
            }
            ValidationError::InvalidArgument { field, expected } => {
                format!(
                    "The value for '{field}' doesn't look right; I expected {expected}. \
                     Could you rephrase?"
                )
            }
            ValidationError::NoFieldsProvided => {
                "What would you like to change? Please give me a new name, a new email, or both."
                    .to_string()
            }
            ValidationError::Malformed(_) => {
                "I couldn't make out the details of that request. Could you rephrase it?"
                    .to_string()
            }
        }
    }
}

/// 検証済みの呼び出し。ディスパッチャによって一度だけ消費される。
#[derive(Debug)]
pub struct Invocation {
    pub spec: &'static ToolSpec,
    args: Map<String, Value>,
}

impl Invocation {
    /// テキスト引数を取得する。未指定の場合は None。
    pub fn text_arg(&self, name: &str) -> Option<&str> {
        self.args.get(name).and_then(|v| v.as_str())
    }
}

/// 生の引数バンドル（Tool Call の JSON 文字列）をスキーマに照らして検証し、
/// 検証済みの `Invocation` を構築する。
///
/// - 必須引数の欠落・空文字は `MissingArguments`（値の捏造はしない）
/// - 型不一致は `InvalidArgument`
/// - `needs_any_optional` なアクションでオプションが全滅なら `NoFieldsProvided`
/// - スキーマに無い余剰引数は無視する
pub fn validate(spec: &'static ToolSpec, raw_arguments: &str) -> Result<Invocation, ValidationError> {
    let trimmed = raw_arguments.trim();
    let bundle: Map<String, Value> = if trimmed.is_empty() {
        Map::new()
    } else {
        serde_json::from_str(trimmed)?
    };

    let mut missing: Vec<&'static str> = Vec::new();
    let mut args = Map::new();

    for arg in spec.args {
        let value = bundle.get(arg.name);

        // null と空白のみのテキストは「未指定」として扱う
        let provided = match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some(v),
        };

        match provided {
            Some(v) => {
                if !arg.ty.matches(v) {
                    return Err(ValidationError::InvalidArgument {
                        field: arg.name,
                        expected: arg.ty.json_type(),
                    });
                }
                args.insert(arg.name.to_string(), v.clone());
            }
            None if arg.required => missing.push(arg.name),
            None => {}
        }
    }

    if !missing.is_empty() {
        return Err(ValidationError::MissingArguments { fields: missing });
    }

    if spec.needs_any_optional {
        let any_optional = spec.optional_args().any(|a| args.contains_key(a.name));
        if !any_optional {
            return Err(ValidationError::NoFieldsProvided);
        }
    }

    Ok(Invocation { spec, args })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::registry;

    #[test]
    fn valid_add_arguments_build_invocation() {
        let spec = registry::get("add_new_user").unwrap();
        let inv = validate(spec, r#"{"name": "Bob", "email": "bob@builder.dev"}"#).unwrap();

        assert_eq!(inv.spec.name, "add_new_user");
        assert_eq!(inv.text_arg("name"), Some("Bob"));
        assert_eq!(inv.text_arg("email"), Some("bob@builder.dev"));
    }

    #[test]
    fn missing_both_required_arguments_names_both() {
        let spec = registry::get("add_new_user").unwrap();
        let err = validate(spec, "{}").unwrap_err();

        match &err {
            ValidationError::MissingArguments { fields } => {
                assert_eq!(fields, &vec!["name", "email"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // 確認質問には欠落した引数名がそのまま含まれる
        let question = err.clarification();
        assert!(question.contains("name"));
        assert!(question.contains("email"));
    }

    #[test]
    fn empty_arguments_string_treated_as_empty_bundle() {
        let spec = registry::get("add_new_user").unwrap();
        let err = validate(spec, "").unwrap_err();
        assert!(matches!(err, ValidationError::MissingArguments { .. }));
    }

    #[test]
    fn blank_string_does_not_satisfy_required_argument() {
        let spec = registry::get("get_user_details").unwrap();
        let err = validate(spec, r#"{"name": "   "}"#).unwrap_err();
        assert!(matches!(err, ValidationError::MissingArguments { .. }));
    }

    #[test]
    fn wrong_type_fails_with_invalid_argument() {
        let spec = registry::get("get_user_details").unwrap();
        let err = validate(spec, r#"{"name": 42}"#).unwrap_err();

        assert!(
            matches!(err, ValidationError::InvalidArgument { field, .. } if field == "name")
        );
    }

    #[test]
    fn update_with_no_optional_fields_fails_early() {
        let spec = registry::get("update_user_details").unwrap();
        let err = validate(spec, r#"{"name": "Alice"}"#).unwrap_err();

        assert!(matches!(err, ValidationError::NoFieldsProvided));
    }

    #[test]
    fn update_with_one_optional_field_passes() {
        let spec = registry::get("update_user_details").unwrap();
        let inv = validate(spec, r#"{"name": "Alice", "new_email": "a@b.com"}"#).unwrap();

        assert_eq!(inv.text_arg("new_email"), Some("a@b.com"));
        assert_eq!(inv.text_arg("new_name"), None);
    }

    #[test]
    fn null_optional_field_treated_as_absent() {
        let spec = registry::get("update_user_details").unwrap();
        let err = validate(spec, r#"{"name": "Alice", "new_name": null, "new_email": null}"#)
            .unwrap_err();
        assert!(matches!(err, ValidationError::NoFieldsProvided));
    }

    #[test]
    fn undeclared_arguments_are_ignored() {
        let spec = registry::get("list_all_users").unwrap();
        let inv = validate(spec, r#"{"surprise": "ignored"}"#).unwrap();
        assert_eq!(inv.text_arg("surprise"), None);
    }

    #[test]
    fn malformed_json_fails_with_malformed() {
        let spec = registry::get("add_new_user").unwrap();
        let err = validate(spec, "not json at all").unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }
}
