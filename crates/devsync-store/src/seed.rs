//! Sample data the stores start with on a fresh install.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use devsync_shared::{Canvas, ItemComment, ListItem, Priority, Subtask};

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn canvas(id: &str, title: &str, updated_at: DateTime<Utc>, starred: bool, template: &str) -> Canvas {
    Canvas {
        id: id.into(),
        title: title.into(),
        updated_at,
        starred,
        template: Some(template.into()),
        blocks: Vec::new(),
        comments: BTreeMap::new(),
        shared_with: Vec::new(),
    }
}

pub fn canvases() -> Vec<Canvas> {
    vec![
        canvas("1", "DevSync Team Meeting Notes", day(2025, 1, 20), true, "Meeting Notes"),
        canvas("2", "Product Roadmap Q1 2025", day(2025, 1, 18), false, "Project Brief"),
        canvas("3", "Sprint Retrospective", day(2025, 1, 15), false, "Retrospective"),
    ]
}

fn subtask(id: &str, title: &str, completed: bool) -> Subtask {
    Subtask {
        id: id.into(),
        title: title.into(),
        completed,
    }
}

fn comment(id: &str, text: &str, author: &str, time: &str) -> ItemComment {
    ItemComment {
        id: id.into(),
        text: text.into(),
        author: author.into(),
        time: time.into(),
    }
}

pub fn list_items() -> Vec<ListItem> {
    vec![
        ListItem {
            id: "1".into(),
            title: "Setup DevSync development environment".into(),
            assignee: "Caleb Adams".into(),
            due_date: "2025-02-15".into(),
            priority: Priority::High,
            status: "In Progress".into(),
            tags: vec!["development".into(), "setup".into()],
            description: "Configure local development environment for DevSync project".into(),
            subtasks: vec![
                subtask("1-1", "Install dependencies", true),
                subtask("1-2", "Configure database", false),
                subtask("1-3", "Setup environment variables", false),
            ],
            comments: vec![
                comment("1-1", "Started working on this task", "Caleb Adams", "2 hours ago"),
                comment("1-2", "Dependencies installed successfully", "Caleb Adams", "1 hour ago"),
            ],
            completed: false,
        },
        ListItem {
            id: "2".into(),
            title: "Implement real-time messaging".into(),
            assignee: "Michael Oti Yamoah".into(),
            due_date: "2025-02-20".into(),
            priority: Priority::High,
            status: "To Do".into(),
            tags: vec!["backend".into(), "websocket".into()],
            description: "Implement WebSocket-based real-time messaging system".into(),
            subtasks: vec![
                subtask("2-1", "Setup WebSocket configuration", false),
                subtask("2-2", "Implement message broadcasting", false),
                subtask("2-3", "Add typing indicators", false),
            ],
            comments: vec![comment(
                "2-1",
                "Researching WebSocket implementation",
                "Michael Oti Yamoah",
                "3 hours ago",
            )],
            completed: false,
        },
        ListItem {
            id: "3".into(),
            title: "Design user interface mockups".into(),
            assignee: "Hakeem Adam".into(),
            due_date: "2025-02-10".into(),
            priority: Priority::Medium,
            status: "Done".into(),
            tags: vec!["design".into(), "ui/ux".into()],
            description: "Create comprehensive UI mockups for DevSync application".into(),
            subtasks: vec![
                subtask("3-1", "Login/signup screens", true),
                subtask("3-2", "Chat interface", true),
                subtask("3-3", "Settings screens", true),
            ],
            comments: vec![
                comment("3-1", "Mockups completed and approved", "Hakeem Adam", "2 days ago"),
                comment("3-2", "Great work on the design!", "DevSync Admin", "1 day ago"),
            ],
            completed: true,
        },
    ]
}
