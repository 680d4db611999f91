//! 主题色定义，全局统一使用

use super::state::StatusKind;
use ratatui::style::Color;

/// 粉色（强调）
pub const PINK: Color = Color::Rgb(245, 169, 184);
/// 蓝色（包名）
pub const BLUE: Color = Color::Rgb(91, 206, 250);
/// 选中行背景色
pub const SEL_BG: Color = Color::Rgb(45, 35, 55);
/// 亮白色
pub const BRIGHT_WHITE: Color = Color::Rgb(255, 255, 255);
/// 暗灰色（次要信息）
pub const DIM: Color = Color::Rgb(130, 130, 140);
/// 描述文字灰色（选中行内）
pub const DESC_DIM: Color = Color::Rgb(180, 180, 190);
/// 可用版本 / 成功
pub const GOOD: Color = Color::Rgb(63, 185, 80);
/// 失败
pub const BAD: Color = Color::Rgb(248, 81, 73);

pub fn status_color(kind: StatusKind) -> Color {
    match kind {
        StatusKind::Progress => Color::Yellow,
        StatusKind::Info => BLUE,
        StatusKind::Success => GOOD,
        StatusKind::Warning => PINK,
        StatusKind::Error => BAD,
    }
}
