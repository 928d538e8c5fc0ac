//! Notification content construction.

use crate::types::Phase;

/// Maximum length for task labels in notifications.
const MAX_TASK_NAME_LENGTH: usize = 100;

/// Title shown when a work phase completes.
pub const WORK_COMPLETE_TITLE: &str = "Focus Session Complete!";

/// Title shown when a break completes.
pub const BREAK_COMPLETE_TITLE: &str = "Break Complete!";

/// Text of a desktop notification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationContent {
    /// Notification title
    pub title: String,
    /// Body text
    pub body: String,
    /// Optional subtitle (the focused task)
    pub subtitle: Option<String>,
}

/// Builder for constructing notification content.
#[derive(Debug, Default)]
pub struct NotificationContentBuilder {
    content: NotificationContent,
}

impl NotificationContentBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the notification title.
    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.content.title = title.to_string();
        self
    }

    /// Sets the notification subtitle.
    #[must_use]
    pub fn subtitle(mut self, subtitle: &str) -> Self {
        self.content.subtitle = Some(subtitle.to_string());
        self
    }

    /// Sets the notification body text.
    #[must_use]
    pub fn body(mut self, body: &str) -> Self {
        self.content.body = body.to_string();
        self
    }

    /// Returns the content.
    #[must_use]
    pub fn build(self) -> NotificationContent {
        self.content
    }
}

impl NotificationContent {
    /// Body text with the subtitle folded in, for commands that have no
    /// separate subtitle field.
    #[must_use]
    pub fn full_body(&self) -> String {
        match &self.subtitle {
            Some(subtitle) => format!("{}\n{}", subtitle, self.body),
            None => self.body.clone(),
        }
    }
}

/// Validates a task label for use in notifications.
///
/// Returns the sanitized label or None if nothing printable remains.
pub fn validate_task_name(task_name: &str) -> Option<String> {
    let sanitized: String = task_name
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_TASK_NAME_LENGTH)
        .collect();
    let sanitized = sanitized.trim();

    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized.to_string())
    }
}

/// Creates the notification for the completion of `phase`.
#[must_use]
pub fn completion_content(phase: Phase, focused_task: Option<&str>) -> NotificationContent {
    let builder = match phase {
        Phase::Work => NotificationContentBuilder::new()
            .title(WORK_COMPLETE_TITLE)
            .body("作業時間が終了しました。休憩してください。"),
        Phase::Break => NotificationContentBuilder::new()
            .title(BREAK_COMPLETE_TITLE)
            .body("休憩時間が終了しました。作業を再開してください。"),
    };

    match focused_task.and_then(validate_task_name) {
        Some(task) => builder.subtitle(&task).build(),
        None => builder.build(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod validate_task_name_tests {
        use super::*;

        #[test]
        fn test_valid() {
            assert_eq!(validate_task_name("API実装"), Some("API実装".to_string()));
        }

        #[test]
        fn test_truncates_long() {
            let long_name = "a".repeat(150);
            let result = validate_task_name(&long_name).unwrap();
            assert_eq!(result.chars().count(), MAX_TASK_NAME_LENGTH);
        }

        #[test]
        fn test_removes_control_chars() {
            assert_eq!(
                validate_task_name("test\n\r\ttask"),
                Some("testtask".to_string())
            );
        }

        #[test]
        fn test_empty_and_blank() {
            assert!(validate_task_name("").is_none());
            assert!(validate_task_name("\n\r\t").is_none());
            assert!(validate_task_name("   ").is_none());
        }
    }

    mod completion_content_tests {
        use super::*;

        #[test]
        fn test_work_title() {
            let content = completion_content(Phase::Work, None);
            assert_eq!(content.title, "Focus Session Complete!");
            assert!(content.subtitle.is_none());
        }

        #[test]
        fn test_break_title() {
            let content = completion_content(Phase::Break, None);
            assert_eq!(content.title, "Break Complete!");
        }

        #[test]
        fn test_focused_task_as_subtitle() {
            let content = completion_content(Phase::Work, Some("レビュー対応"));
            assert_eq!(content.subtitle.as_deref(), Some("レビュー対応"));
            assert!(content.full_body().starts_with("レビュー対応\n"));
        }
    }
}
