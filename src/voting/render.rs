//! HTML rendering for the voter and admin views.

use super::model::{Video, Vote};
use super::widget::{AdminView, View, VoterView};
use crate::config::WidgetConfig;
use std::fmt::Write;

/// Page-level data that is not part of the view itself
#[derive(Debug, Clone)]
pub struct PageContext<'a> {
    pub session_id: &'a str,
    pub widget: &'a WidgetConfig,
    /// Address to swap into the location bar, when it was rewritten
    pub replace_address: Option<String>,
}

/// Render the full HTML document for `view`
pub fn page(view: &View, ctx: &PageContext<'_>) -> String {
    let body = match view {
        View::Voter(voter) => voter_view(voter, ctx),
        View::Admin(admin) => admin_view(admin, ctx),
    };

    let mut html = String::with_capacity(body.len() + 512);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(&ctx.widget.title));
    html.push_str("</head>\n<body>\n");
    html.push_str(&body);
    if let Some(address) = &ctx.replace_address {
        // serde_json gives a valid JS string literal; `<` is escaped so the
        // literal cannot close the script element.
        let literal = serde_json::to_string(address)
            .unwrap_or_else(|_| "\"/\"".to_string())
            .replace('<', "\\u003c");
        let _ = writeln!(
            html,
            "<script>window.history.replaceState(null, \"\", {});</script>",
            literal
        );
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn voter_view(view: &VoterView, ctx: &PageContext<'_>) -> String {
    let widget = ctx.widget;
    let mut html = String::new();
    html.push_str("<div class=\"user-view\">\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape_html(&widget.title));
    html.push_str("<h3>Select the Liar</h3>\n<div class=\"videos\">\n");
    for video in Video::ALL {
        let _ = writeln!(
            html,
            "<video id=\"{}\" controls><source src=\"{}\" type=\"video/mp4\">Your browser doesn't support videos</video>",
            video.as_str(),
            escape_html(widget.video_url(video))
        );
    }
    html.push_str("</div>\n");

    let disabled = if view.controls_enabled() { "" } else { " disabled" };
    html.push_str("<form class=\"buttons\" method=\"post\" action=\"/vote\">\n");
    let _ = writeln!(
        html,
        "<input type=\"hidden\" name=\"session\" value=\"{}\">",
        escape_html(ctx.session_id)
    );
    for video in Video::ALL {
        let _ = writeln!(
            html,
            "<button type=\"submit\" name=\"choice\" value=\"{}\"{}>Choose {} as Liar</button>",
            video.as_str(),
            disabled,
            video.label()
        );
    }
    html.push_str("</form>\n");

    if view.has_voted {
        html.push_str("<p class=\"thanks\">Thank you for voting!</p>\n");
    }
    html.push_str("</div>\n");
    html
}

fn admin_view(view: &AdminView, ctx: &PageContext<'_>) -> String {
    let mut html = String::new();
    html.push_str("<div class=\"admin-view\">\n<h1>Admin Dashboard</h1>\n<div class=\"stats\">\n");
    let _ = writeln!(html, "<h3>Total Votes: {}</h3>", view.tally.total());
    let _ = writeln!(html, "<p>Correct: {}</p>", view.tally.correct);
    let _ = writeln!(html, "<p>Wrong: {}</p>", view.tally.wrong);
    let _ = writeln!(html, "<p>Success Rate: {}%</p>", view.success_percentage);
    html.push_str("</div>\n<h3>All Responses</h3>\n<table>\n");
    html.push_str(
        "<thead><tr><th>Time</th><th>Liar Choice</th><th>Truth Choice</th><th>Correct?</th></tr></thead>\n<tbody>\n",
    );
    for vote in &view.responses {
        response_row(&mut html, vote);
    }
    html.push_str("</tbody>\n</table>\n");
    html.push_str("<form method=\"post\" action=\"/refresh\">\n");
    let _ = writeln!(
        html,
        "<input type=\"hidden\" name=\"session\" value=\"{}\">",
        escape_html(ctx.session_id)
    );
    html.push_str("<button type=\"submit\">Refresh Data</button>\n</form>\n</div>\n");
    html
}

fn response_row(html: &mut String, vote: &Vote) {
    let (class, mark) = if vote.is_correct() {
        ("correct", "&#9989;")
    } else {
        ("wrong", "&#10060;")
    };
    let _ = writeln!(
        html,
        "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{}</td></tr>",
        vote.submitted_at().format("%Y-%m-%d %H:%M:%S UTC"),
        vote.selected_liar(),
        vote.selected_truth(),
        class,
        mark
    );
}

/// Escape text for HTML element content and quoted attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
