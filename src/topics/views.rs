//! Server-rendered HTML pages.

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::model::Topic;
use super::service::DueList;

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} · Study Tracker</title>
</head>
<body>
<nav><a href="/">Dashboard</a> | <a href="/enter-topic">Enter topic</a> | <a href="/enter-missing-topic">Enter missing topic</a> | <a href="/review_topics">Review</a> | <a href="/classes">Classes</a></nav>
<h1>{title}</h1>
{body}
</body>
</html>"#,
        title = encode_text(title),
    )
}

pub fn dashboard(total: Option<usize>, due: Option<usize>) -> String {
    let stats = match (total, due) {
        (Some(total), Some(due)) => {
            format!("<p>{total} topics recorded, {due} due for review today.</p>")
        }
        _ => "<p>Topic counts are unavailable.</p>".to_string(),
    };
    layout("Dashboard", &stats)
}

pub fn enter_topic_form() -> String {
    layout(
        "Enter topic",
        r#"<form method="post" action="/enter-topic">
<label>Title <input name="title" required></label>
<label>Description <textarea name="description"></textarea></label>
<button type="submit">Save</button>
</form>"#,
    )
}

pub fn enter_missing_topic_form() -> String {
    layout(
        "Enter missing topic",
        r#"<form method="post" action="/enter-missing-topic">
<label>Title <input name="title" required></label>
<label>Description <textarea name="description"></textarea></label>
<label>Date studied <input name="date_added" type="date" required></label>
<button type="submit">Save</button>
</form>"#,
    )
}

fn topic_row(topic: &Topic) -> String {
    let id = topic.id.to_string();
    let id = encode_double_quoted_attribute(&id);
    let description = topic
        .description
        .as_deref()
        .map(|d| format!("<p>{}</p>", encode_text(d)))
        .unwrap_or_default();
    format!(
        r#"<li>
<strong>{title}</strong> <small>added {added}</small>
{description}
<form method="post" action="/review/{id}/good" style="display:inline"><button type="submit">Good</button></form>
<form method="post" action="/review/{id}/again" style="display:inline"><button type="submit">Again</button></form>
</li>"#,
        title = encode_text(&topic.title),
        added = topic.date_added,
    )
}

pub fn review_topics(due: &DueList) -> String {
    let mut body = String::new();
    if let Some(advisory) = due.advisory() {
        body.push_str(&format!(r#"<p class="advisory">{}</p>"#, encode_text(advisory)));
    }
    if due.topics().is_empty() {
        body.push_str("<p>Nothing to review today.</p>");
    } else {
        body.push_str("<ul>");
        for topic in due.topics() {
            body.push_str(&topic_row(topic));
        }
        body.push_str("</ul>");
    }
    layout("Topics to review", &body)
}

pub fn classes() -> String {
    layout("Classes", "<p>No classes scheduled.</p>")
}
