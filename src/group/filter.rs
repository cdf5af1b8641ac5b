//! # 节点过滤正则
//!
//! 把包含关键词与全局排除关键词编译成客户端使用的 `filter` 字符串。
//!
//! - 无排除词：`A|B`
//! - 有排除词：`(?!.*(X|Y)).*(A|B)`，即节点名不含任何排除词、且含任一包含词
//!
//! 关键词按原样拼接（不转义、不去重），关键词本身可以是正则片段。

/// 编译过滤器
///
/// 调用方保证 `include` 非空；空关键词的组属于配置错误，应在此之前跳过。
pub fn compile<I, E>(include: &[I], exclude: &[E]) -> String
where
    I: AsRef<str>,
    E: AsRef<str>,
{
    debug_assert!(!include.is_empty(), "filter requires at least one keyword");

    let alternation = join(include);
    if exclude.is_empty() {
        return alternation;
    }

    format!("(?!.*({})).*({})", join(exclude), alternation)
}

fn join<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("|")
}
