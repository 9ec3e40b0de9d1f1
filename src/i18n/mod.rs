// ============================================================================
// MarkFlow - 国际化模块
// ============================================================================
//
// 文件: src/i18n/mod.rs
// 职责: 界面文案的语言选择与参数填充
// 边界:
//   - ✅ 语言解析（配置中的语言名 -> 翻译表）
//   - ✅ 缺失条目回退到英文表
//   - ✅ t! / tf! 宏与按序参数填充
//   - ❌ 不应包含具体翻译内容
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

pub mod en_us;
pub mod zh_cn;

use crate::models::config::Config;

/// 翻译表：(键, 模板)
pub type Table = &'static [(&'static str, &'static str)];

/// 支持的界面语言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    /// 解析配置中的语言名，未知语言使用英文
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "zh_cn" | "zh" => Language::Chinese,
            _ => Language::English,
        }
    }

    /// 当前配置的语言，配置未初始化时为英文
    pub fn current() -> Self {
        Config::get_language()
            .map(|name| Self::parse(&name))
            .unwrap_or(Language::English)
    }

    fn table(self) -> Table {
        match self {
            Language::English => en_us::TRANSLATIONS,
            Language::Chinese => zh_cn::TRANSLATIONS,
        }
    }
}

fn lookup(table: Table, key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|&(_, v)| v)
}

/// 按指定语言查找文案
pub fn translate(language: Language, key: &str) -> String {
    translate_in(language.table(), key)
}

/// 在翻译表中查找文案；缺失时依次回退到英文表和键本身
fn translate_in(table: Table, key: &str) -> String {
    lookup(table, key)
        .or_else(|| lookup(en_us::TRANSLATIONS, key))
        .map(str::to_string)
        .unwrap_or_else(|| {
            tracing::debug!(key, "missing translation");
            key.to_string()
        })
}

/// 按当前语言获取文案
pub fn get_translation(key: &str) -> String {
    translate(Language::current(), key)
}

/// 简单翻译宏
#[macro_export]
macro_rules! t {
    ($key:expr) => {
        $crate::i18n::get_translation($key)
    };
}

/// 依次替换模板中的 `{}` 占位符，多余参数被忽略
pub fn format_with_args(template: String, args: Vec<String>) -> String {
    let mut result = template;
    let mut cursor = 0;
    for arg in &args {
        let Some(pos) = result[cursor..].find("{}").map(|p| p + cursor) else {
            break;
        };
        result.replace_range(pos..pos + 2, arg);
        // 参数本身可能含有 `{}`，从替换结果之后继续查找
        cursor = pos + arg.len();
    }
    result
}

/// 带参数的翻译宏
#[macro_export]
macro_rules! tf {
    ($key:expr, $($arg:expr),*) => {{
        let template = $crate::i18n::get_translation($key);
        let args = vec![$(format!("{}", $arg)),*];
        $crate::i18n::format_with_args(template, args)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn language_names_are_normalised() {
        assert_eq!(Language::parse("zh_cn"), Language::Chinese);
        assert_eq!(Language::parse("zh-CN"), Language::Chinese);
        assert_eq!(Language::parse("en_us"), Language::English);
        assert_eq!(Language::parse("fr"), Language::English);
    }

    #[test]
    fn missing_entries_fall_back_to_english_then_key() {
        let (key, english) = en_us::TRANSLATIONS[0];
        let partial: Table = &[("summary.title", "处理汇总")];

        assert_eq!(translate_in(partial, "summary.title"), "处理汇总");
        assert_eq!(translate_in(partial, key), english);
        assert_eq!(translate(Language::Chinese, "no.such.key"), "no.such.key");
    }

    #[test]
    fn tables_cover_the_same_keys() {
        let english: HashSet<&str> = en_us::TRANSLATIONS.iter().map(|(k, _)| *k).collect();
        let chinese: HashSet<&str> = zh_cn::TRANSLATIONS.iter().map(|(k, _)| *k).collect();
        assert_eq!(english, chinese);
    }

    #[test]
    fn arguments_fill_placeholders_in_order() {
        let filled = format_with_args("{} -> {}".to_string(), vec!["a".into(), "b".into()]);
        assert_eq!(filled, "a -> b");
    }

    #[test]
    fn placeholder_inside_an_argument_is_left_alone() {
        let filled = format_with_args("{} and {}".to_string(), vec!["{}".into(), "x".into()]);
        assert_eq!(filled, "{} and x");
    }
}
