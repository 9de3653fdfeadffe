//! Core types for the taskdeck server.

use serde::{Deserialize, Deserializer, Serialize};

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Parse a stored priority string. Unrecognized values fall back to medium.
    pub fn parse(s: &str) -> Priority {
        match s {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Completion filter for task listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

/// A tracked task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub notes: String,
    pub priority: Priority,
    pub due_date: Option<String>,
    /// Comma-joined tag tokens, e.g. "work,errands".
    pub tags: String,
    pub is_completed: bool,
    pub sort_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

/// Test whether a comma-joined tag list contains `tag` as a whole token.
/// A filter for "art" must not match a task tagged "cart".
pub fn has_tag(tags: &str, tag: &str) -> bool {
    let wanted = tag.trim();
    !wanted.is_empty() && tags.split(',').any(|t| t.trim() == wanted)
}

/// Tags as clients may send them: an array of strings or one pre-joined string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Joined(String),
}

impl TagsInput {
    /// Normalize to the stored comma-joined form: tokens trimmed, empties dropped.
    pub fn normalize(&self) -> String {
        let items: Vec<&str> = match self {
            TagsInput::List(items) => items.iter().map(String::as_str).collect(),
            TagsInput::Joined(s) => vec![s.as_str()],
        };
        items
            .iter()
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Input for creating a task. Everything but `title` is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<String>,
    pub tags: Option<TagsInput>,
    pub is_completed: Option<bool>,
}

/// Partial update for a task. Absent fields keep their current values.
///
/// `due_date` is tri-state: absent keeps the current value, an explicit
/// JSON null (or empty string) clears it, a string replaces it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
    pub tags: Option<TagsInput>,
    pub is_completed: Option<bool>,
    pub sort_order: Option<i64>,
}

/// Deserialize a field so that "present but null" is distinguishable from
/// "absent": missing stays None via the field default, null becomes
/// Some(None), a value becomes Some(Some(v)).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parse_falls_back_to_medium() {
        assert_eq!(Priority::parse("low"), Priority::Low);
        assert_eq!(Priority::parse("high"), Priority::High);
        assert_eq!(Priority::parse("medium"), Priority::Medium);
        assert_eq!(Priority::parse("urgent"), Priority::Medium);
        assert_eq!(Priority::parse(""), Priority::Medium);
    }

    #[test]
    fn has_tag_matches_whole_tokens_only() {
        assert!(has_tag("work,personal", "work"));
        assert!(has_tag("work, personal", "personal"));
        assert!(!has_tag("homework", "work"));
        assert!(!has_tag("cart", "art"));
        assert!(!has_tag("", "work"));
        assert!(!has_tag("work", ""));
    }

    #[test]
    fn tags_normalize_from_list() {
        let input = TagsInput::List(vec![" work ".to_string(), "".to_string(), "home".to_string()]);
        assert_eq!(input.normalize(), "work,home");
    }

    #[test]
    fn tags_normalize_from_joined_string() {
        let input = TagsInput::Joined("work, home,,errands ".to_string());
        assert_eq!(input.normalize(), "work,home,errands");
    }

    #[test]
    fn tags_input_deserializes_both_shapes() {
        let from_list: NewTask = serde_json::from_str(r#"{"title":"a","tags":["x","y"]}"#).unwrap();
        assert_eq!(from_list.tags.unwrap().normalize(), "x,y");

        let from_string: NewTask = serde_json::from_str(r#"{"title":"a","tags":"x, y"}"#).unwrap();
        assert_eq!(from_string.tags.unwrap().normalize(), "x,y");
    }

    #[test]
    fn patch_due_date_is_tri_state() {
        let absent: TaskPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.due_date, None);

        let cleared: TaskPatch = serde_json::from_str(r#"{"due_date":null}"#).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        let set: TaskPatch = serde_json::from_str(r#"{"due_date":"2026-08-07"}"#).unwrap();
        assert_eq!(set.due_date, Some(Some("2026-08-07".to_string())));
    }
}
