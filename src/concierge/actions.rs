//! Frontend actions embedded in assistant messages

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NAVIGATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)navigate to\s+([^\n]+)").expect("valid navigate pattern"));
static SHOW_VIDEO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)show video\s+(\w+)").expect("valid video pattern"));
static SHOW_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)show image\s+(\w+)").expect("valid image pattern"));
static SHOW_BLOG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)show blog content").expect("valid blog pattern"));

/// Something the frontend should do alongside showing the message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Navigate { target: String },
    ShowVideo { content: String },
    ShowImage { content: String },
    ShowBlogContent,
}

/// Text after the last match of `pattern`
fn last_capture(pattern: &Regex, message: &str) -> Option<String> {
    pattern
        .captures_iter(message)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .trim()
                .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | ',' | ';'))
                .to_string()
        })
        .filter(|s| !s.is_empty())
}

/// Find actions in an assistant message (case-insensitive)
pub fn extract_actions(message: &str) -> Vec<Action> {
    let mut actions = Vec::new();

    if let Some(target) = last_capture(&NAVIGATE, message) {
        actions.push(Action::Navigate { target });
    }
    if let Some(id) = last_capture(&SHOW_VIDEO, message) {
        actions.push(Action::ShowVideo {
            content: format!("/api/content/video/{}/", id),
        });
    }
    if let Some(id) = last_capture(&SHOW_IMAGE, message) {
        actions.push(Action::ShowImage {
            content: format!("/api/content/image/{}/", id),
        });
    }
    if SHOW_BLOG.is_match(message) {
        actions.push(Action::ShowBlogContent);
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigate_target() {
        let actions = extract_actions("Sure! Navigate to the Services page.");
        assert_eq!(
            actions,
            vec![Action::Navigate {
                target: "the Services page".to_string()
            }]
        );
    }

    #[test]
    fn test_media_actions() {
        let actions = extract_actions("SHOW VIDEO 12 and then show image 3");
        assert_eq!(
            actions,
            vec![
                Action::ShowVideo {
                    content: "/api/content/video/12/".to_string()
                },
                Action::ShowImage {
                    content: "/api/content/image/3/".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_blog_and_none() {
        assert_eq!(
            extract_actions("Let me show blog content for you"),
            vec![Action::ShowBlogContent]
        );
        assert!(extract_actions("Hello there").is_empty());
    }

    #[test]
    fn test_action_json_shape() {
        let json = serde_json::to_value(Action::ShowBlogContent).unwrap();
        assert_eq!(json, serde_json::json!({"type": "show_blog_content"}));

        let json = serde_json::to_value(Action::Navigate {
            target: "about".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "navigate");
        assert_eq!(json["target"], "about");
    }
}
