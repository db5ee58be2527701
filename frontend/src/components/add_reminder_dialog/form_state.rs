//! 表单状态管理模块
//!
//! 将零散的 signal 整合为 `FormState` 结构体，负责数据的持有、重置与转换。

use leptos::prelude::*;
use medizap::shared::{NewReminder, RawTime};

/// 新建提醒的表单状态
///
/// 使用 `RwSignal` 因为它实现了 `Copy` trait，非常适合作为 Props 在组件间传递。
#[derive(Clone, Copy)]
pub struct FormState {
    pub title: RwSignal<String>,
    pub message: RwSignal<String>,
    /// `datetime-local` 输入框的原始值
    pub when: RwSignal<String>,
}

impl FormState {
    pub fn new() -> Self {
        Self {
            title: RwSignal::new(String::new()),
            message: RwSignal::new(String::new()),
            when: RwSignal::new(String::new()),
        }
    }

    pub fn reset(&self) {
        self.title.set(String::new());
        self.message.set(String::new());
        self.when.set(String::new());
    }

    /// 将表单状态转换为写入载荷
    pub fn to_request(&self) -> Result<NewReminder, String> {
        build_reminder(&self.title.get(), &self.message.get(), &self.when.get())
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

fn build_reminder(title: &str, message: &str, when: &str) -> Result<NewReminder, String> {
    let (title, message) = (title.trim(), message.trim());
    if title.is_empty() && message.is_empty() {
        return Err("Please enter a title or a message".to_string());
    }
    let at = RawTime::Text(when.to_string())
        .to_date_time()
        .ok_or_else(|| "Please pick a valid date and time".to_string())?;
    Ok(NewReminder::new(title, message, at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_reminder_requires_label_and_time() {
        assert!(build_reminder("  ", "", "2026-01-05T09:30").is_err());
        assert!(build_reminder("Metformin", "", "tomorrow").is_err());

        let reminder = build_reminder(" Metformin ", "", "2026-01-05T09:30:00Z").unwrap();
        assert_eq!(reminder.title, "Metformin");
        assert_eq!(reminder.date_time.as_millis(), 1_767_605_400_000);
        assert!(!reminder.is_dismissed);
    }
}
