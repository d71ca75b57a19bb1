//! アクションレジストリ — 呼び出し可能アクションの静的カタログ
//!
//! 各アクションの名前、使用ポリシー、引数スキーマ、ミューテーションフラグを
//! 宣言的に保持する。起動時に一度構築され、実行時に変更されない。
//! ポリシー文には「いつ使うか」だけでなく「いつ使ってはならないか」の
//! 否定的ガイダンスを含める。create と update の混同や、書き込み前の
//! 不要なルックアップ連鎖を防ぐのはこの文言である。

use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use serde_json::{json, Map, Value};

/// greet_user アクションの固定応答テキスト。
/// return-direct: この内容はそのまま呼び出し元に返され、再解釈されない。
pub const GREETING: &str = "Hello! I am a user database management assistant.\n\
I can help you with the following tasks:\n\
- List all users\n\
- Find a specific user by name\n\
- Add a new user to the database\n\
- Update an existing user's name or email\n\
- Delete a user from the database";

/// 引数の型。現状はテキストのみだが、スキーマ上の型として明示する。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgType {
    Text,
}

impl ArgType {
    /// JSON Schema 上の型名を返す。
    pub fn json_type(self) -> &'static str {
        match self {
            ArgType::Text => "string",
        }
    }

    /// 受信した JSON 値がこの型に適合するかを判定する。
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ArgType::Text => value.is_string(),
        }
    }
}

/// 1 引数分のスキーマ定義
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    pub name: &'static str,
    pub ty: ArgType,
    pub required: bool,
    pub description: &'static str,
}

/// 1 アクション分のディスクリプタ
#[derive(Debug)]
pub struct ToolSpec {
    /// アクション名（カタログ内で一意）
    pub name: &'static str,
    /// 使用ポリシー（否定的ガイダンスを含む自然言語）
    pub usage: &'static str,
    /// 引数スキーマ（宣言順を保持）
    pub args: &'static [ArgSpec],
    /// ストアへの書き込みを伴うか
    pub mutating: bool,
    /// 出力をそのまま呼び出し元へ返すか（再解釈しない）
    pub return_direct: bool,
    /// オプション引数のうち最低 1 つの指定を要求するか（update 用）
    pub needs_any_optional: bool,
}

impl ToolSpec {
    /// OpenAI Function Calling 用のツール定義に変換する。
    pub fn to_chat_tool(&self) -> ChatCompletionTool {
        let mut properties = Map::new();
        let mut required: Vec<&str> = Vec::new();

        for arg in self.args {
            properties.insert(
                arg.name.to_string(),
                json!({
                    "type": arg.ty.json_type(),
                    "description": arg.description,
                }),
            );
            if arg.required {
                required.push(arg.name);
            }
        }

        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: self.name.to_string(),
                description: Some(self.usage.to_string()),
                parameters: Some(json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                })),
                strict: None,
            },
        }
    }

    /// 必須引数のスキーマを宣言順で返す。
    pub fn required_args(&self) -> impl Iterator<Item = &ArgSpec> {
        self.args.iter().filter(|a| a.required)
    }

    /// オプション引数のスキーマを宣言順で返す。
    pub fn optional_args(&self) -> impl Iterator<Item = &ArgSpec> {
        self.args.iter().filter(|a| !a.required)
    }
}

/// アクションカタログ本体。順序はユーザー向けの案内順に揃える。
const CATALOG: &[ToolSpec] = &[
    ToolSpec {
        name: "list_all_users",
        usage: "Lists all users currently in the database. Use this only when the user asks \
                to see every user. Do NOT use it to look up a single user, and never as a \
                precursor to adding, updating, or deleting.",
        args: &[],
        mutating: false,
        return_direct: false,
        needs_any_optional: false,
    },
    ToolSpec {
        name: "get_user_details",
        usage: "Gets the details for a single user by their name. Use this only for read \
                lookups. Never call it as a precursor to an update or delete; those actions \
                locate the user themselves. Forbidden when the request contains modification \
                verbs like 'update', 'change', 'edit', or 'delete'.",
        args: &[ArgSpec {
            name: "name",
            ty: ArgType::Text,
            required: true,
            description: "The name of the user to search for.",
        }],
        mutating: false,
        return_direct: false,
        needs_any_optional: false,
    },
    ToolSpec {
        name: "add_new_user",
        usage: "Adds a brand-new user to the database. Use this ONLY when the user clearly \
                wants to create someone who does not exist yet. Forbidden when the request \
                contains modification verbs like 'update', 'modify', 'change', or 'edit'; \
                use update_user_details for those.",
        args: &[
            ArgSpec {
                name: "name",
                ty: ArgType::Text,
                required: true,
                description: "The full name of the new user.",
            },
            ArgSpec {
                name: "email",
                ty: ArgType::Text,
                required: true,
                description: "The unique email address for the new user.",
            },
        ],
        mutating: true,
        return_direct: false,
        needs_any_optional: false,
    },
    ToolSpec {
        name: "update_user_details",
        usage: "Updates the name and/or email of an existing user, matched by exact name. \
                Use this whenever the request asks to update, modify, change, or edit a \
                user. At least one of new_name or new_email must be supplied. Never use \
                add_new_user for these requests.",
        args: &[
            ArgSpec {
                name: "name",
                ty: ArgType::Text,
                required: true,
                description: "The exact current name of the user to update.",
            },
            ArgSpec {
                name: "new_name",
                ty: ArgType::Text,
                required: false,
                description: "The new name for the user, if it should change.",
            },
            ArgSpec {
                name: "new_email",
                ty: ArgType::Text,
                required: false,
                description: "The new email address for the user, if it should change.",
            },
        ],
        mutating: true,
        return_direct: false,
        needs_any_optional: true,
    },
    ToolSpec {
        name: "delete_user",
        usage: "Permanently deletes a user from the database, matched by exact name. Use \
                this only when the user explicitly asks to remove or delete someone. There \
                is no undo, so never call it speculatively.",
        args: &[ArgSpec {
            name: "name",
            ty: ArgType::Text,
            required: true,
            description: "The exact name of the user to delete.",
        }],
        mutating: true,
        return_direct: false,
        needs_any_optional: false,
    },
    ToolSpec {
        name: "greet_user",
        usage: "Provides a greeting and explains the assistant's capabilities. Use this when \
                the user says hello, hi, or asks what you can do. Its output is returned to \
                the user verbatim.",
        args: &[],
        mutating: false,
        return_direct: true,
        needs_any_optional: false,
    },
];

/// カタログ全体を宣言順で返す。
pub fn all() -> &'static [ToolSpec] {
    CATALOG
}

/// 名前でディスクリプタを取得する。
pub fn get(name: &str) -> Option<&'static ToolSpec> {
    CATALOG.iter().find(|spec| spec.name == name)
}
