//! 输出解析函数

use super::types::UpgradeRecord;
use std::collections::HashSet;

/// 表头下划线至少要这么长，避免把 winget 的 `-` 旋转动画帧当成分隔线
const SEPARATOR_MIN_LEN: usize = 10;

/// 右侧固定锚定的列数：Id / Version / Available / Source
const ANCHORED_COLUMNS: usize = 4;

/// 清理终端输出中的 ANSI 转义序列和特殊字符
///
/// winget 在输出表格前会用 `\r` 反复重绘进度动画，这里把每个 `\r` 帧拆成独立的行。
pub fn clean_terminal_output(input: &str) -> String {
    let mut result = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            '\r' => {
                if chars.peek() != Some(&'\n') && !result.ends_with('\n') {
                    result.push('\n');
                }
            }
            c if c.is_control() && c != '\n' && c != '\t' => {}
            _ => result.push(c),
        }
    }

    result
}

/// 是否为表头下的 `-----` 分隔线
fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= SEPARATOR_MIN_LEN && trimmed.chars().all(|c| c == '-')
}

/// 解析单行数据。列数不足时返回 None
///
/// 名称列是自由文本，可能包含空格，所以只从右往左锚定最后四列，
/// 剩下的前导 token 用空格拼回名称。
pub fn parse_upgrade_row(line: &str) -> Option<UpgradeRecord> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < ANCHORED_COLUMNS + 1 {
        return None;
    }

    let n = tokens.len();
    Some(UpgradeRecord {
        name: tokens[..n - ANCHORED_COLUMNS].join(" "),
        id: tokens[n - 4].to_string(),
        current_version: tokens[n - 3].to_string(),
        available_version: tokens[n - 2].to_string(),
        source_repository: tokens[n - 1].to_string(),
    })
}

/// 解析 `winget upgrade` 的表格输出
///
/// 找不到分隔线时说明格式无法识别，返回空列表而不是报错。
/// 同一个 id 只保留第一次出现的行。分隔线之后只按列数判断，
/// 不区分数据行和 winget 的尾注：五个词以上的尾注也会成为一条记录。
pub fn parse_upgrade_table(output: &str) -> Vec<UpgradeRecord> {
    let cleaned = clean_terminal_output(output);
    let mut lines = cleaned.lines();

    if !lines.by_ref().any(is_separator) {
        log::debug!("未找到表头分隔线，输出格式无法识别");
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        match parse_upgrade_row(line) {
            Some(record) => {
                if seen.insert(record.id.clone()) {
                    records.push(record);
                } else {
                    log::trace!("跳过重复的 id: {}", record.id);
                }
            }
            None => log::trace!("跳过列数不足的行: {:?}", line),
        }
    }

    records
}
