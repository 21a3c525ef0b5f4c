#![forbid(unsafe_code)]

use crate::assets::LAYOUT_HTML;
use bubbles_core::form::{BubbleForm, FIELD_CSRF_TOKEN, FIELD_DESCRIPTION, FIELD_WHEN_DUE, FormError};
use bubbles_core::model::{ActiveGroups, Bubble, DESCRIPTION_MAX_CHARS, DueBucket};
use std::fmt::Write as _;

pub(crate) fn index_page(groups: &ActiveGroups, form: &BubbleForm, csrf_token: &str) -> String {
    let mut body = String::new();
    body.push_str("<h1>Bubbles</h1>\n");
    body.push_str(&bubble_form("/", form, csrf_token));
    body.push_str("<section class=\"groups\">\n");
    for due in DueBucket::ALL {
        let _ = writeln!(
            body,
            "<div class=\"group\" id=\"group-{}\">\n<h2>{}</h2>",
            due.as_key(),
            escape_html(due.label())
        );
        body.push_str(&bubble_list(groups.group(due), true));
        body.push_str("</div>\n");
    }
    body.push_str("</section>\n");
    layout("Bubbles", &body)
}

pub(crate) fn popped_page(popped: &[Bubble], form: &BubbleForm, csrf_token: &str) -> String {
    let mut body = String::new();
    body.push_str("<h1>Popped bubbles</h1>\n");
    body.push_str(&bubble_form("/popped", form, csrf_token));
    body.push_str("<section class=\"group\" id=\"group-popped\">\n");
    body.push_str(&bubble_list(popped, false));
    body.push_str("</section>\n");
    layout("Popped", &body)
}

pub(crate) fn not_found_page(message: &str) -> String {
    let body = format!(
        "<h1>Not Found</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to your bubbles</a></p>\n",
        escape_html(message)
    );
    layout("Not Found", &body)
}

pub(crate) fn server_error_page() -> String {
    layout(
        "Internal Server Error",
        "<h1>Internal Server Error</h1>\n<p>Something went wrong while handling the request.</p>\n",
    )
}

fn layout(title: &str, body: &str) -> String {
    LAYOUT_HTML
        .replace("{{title}}", &escape_html(title))
        .replace("{{body}}", body)
}

fn bubble_form(action: &str, form: &BubbleForm, csrf_token: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<form class=\"bubble-form\" method=\"post\" action=\"{}\">",
        escape_html(action)
    );
    let _ = writeln!(
        out,
        "<input type=\"hidden\" name=\"{FIELD_CSRF_TOKEN}\" value=\"{}\">",
        escape_html(csrf_token)
    );
    out.push_str(&error_list(&form.form_errors()));
    let _ = writeln!(
        out,
        "<input type=\"text\" name=\"{FIELD_DESCRIPTION}\" value=\"{}\" maxlength=\"{DESCRIPTION_MAX_CHARS}\" \
         placeholder=\"Bubble description\" autocomplete=\"off\" autofocus required>",
        escape_html(&form.description)
    );
    out.push_str(&error_list(&form.field_errors(FIELD_DESCRIPTION)));
    let _ = writeln!(out, "<select name=\"{FIELD_WHEN_DUE}\">");
    for due in DueBucket::ALL {
        let selected = if form.when_due == due.label() {
            " selected"
        } else {
            ""
        };
        let label = escape_html(due.label());
        let _ = writeln!(out, "<option value=\"{label}\"{selected}>{label}</option>");
    }
    out.push_str("</select>\n");
    out.push_str(&error_list(&form.field_errors(FIELD_WHEN_DUE)));
    out.push_str("<button type=\"submit\" name=\"submit\" value=\"Submit\">Submit</button>\n");
    out.push_str("</form>\n");
    out
}

fn error_list(errors: &[FormError]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"errors\">\n");
    for err in errors {
        let _ = writeln!(out, "<li>{}</li>", escape_html(err.message()));
    }
    out.push_str("</ul>\n");
    out
}

fn bubble_list(bubbles: &[Bubble], poppable: bool) -> String {
    if bubbles.is_empty() {
        return "<p class=\"empty\">Nothing here.</p>\n".to_string();
    }
    let mut out = String::from("<ul class=\"bubbles\">\n");
    for bubble in bubbles {
        let description = escape_html(&bubble.description);
        if poppable {
            let _ = writeln!(
                out,
                "<li class=\"bubble\" data-id=\"{id}\"><span>{description}</span> \
                 <a href=\"/pop?id={id}\">Pop</a></li>",
                id = bubble.id
            );
        } else {
            let _ = writeln!(
                out,
                "<li class=\"bubble popped\" data-id=\"{}\"><span>{description}</span></li>",
                bubble.id
            );
        }
    }
    out.push_str("</ul>\n");
    out
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}
