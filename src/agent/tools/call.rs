//! Tool Call のストリーミング蓄積ヘルパー
//!
//! ストリーミングで受信した Tool Call チャンクを蓄積し、
//! 完成した Tool Call を生の Invocation に変換するユーティリティ。

use async_openai::types::ChatCompletionMessageToolCallChunk;
use tracing::{debug, warn};

use crate::agent::types::RawInvocation;

/// Tool Call のストリーミングチャンクを蓄積するための構造体
#[derive(Debug, Default, Clone)]
pub struct ToolCallAccumulator {
    pub id: String,
    pub function_name: String,
    pub arguments: String,
}

/// ストリーミングで受信した Tool Call チャンクを蓄積する
pub fn accumulate_tool_call(
    accumulators: &mut Vec<ToolCallAccumulator>,
    chunk: &ChatCompletionMessageToolCallChunk,
) {
    let idx = chunk.index as usize;

    // 必要に応じてアキュムレータを拡張
    while accumulators.len() <= idx {
        accumulators.push(ToolCallAccumulator::default());
    }

    let acc = &mut accumulators[idx];

    if let Some(ref id) = chunk.id {
        acc.id = id.clone();
    }
    if let Some(ref func) = chunk.function {
        if let Some(ref name) = func.name {
            acc.function_name = name.clone();
        }
        if let Some(ref args) = func.arguments {
            acc.arguments.push_str(args);
        }
    }
}

/// 蓄積した Tool Call から生の Invocation を取り出す。
///
/// 1 リクエストにつき選択されるアクションは 0 または 1 件。モデルが複数の
/// Tool Call を返した場合は先頭のみを採用し、残りは警告を出して破棄する。
pub fn first_invocation(tool_calls: &[ToolCallAccumulator]) -> Option<RawInvocation> {
    let first = tool_calls.iter().find(|tc| !tc.function_name.is_empty())?;

    if tool_calls.len() > 1 {
        warn!(
            total = tool_calls.len(),
            kept = %first.function_name,
            "Model returned multiple tool calls; keeping only the first"
        );
    }

    debug!(
        function_name = %first.function_name,
        arguments = %first.arguments,
        id = %first.id,
        "Extracted tool call"
    );

    Some(RawInvocation {
        name: first.function_name.clone(),
        arguments: first.arguments.clone(),
    })
}
