//! HTML rendering of a [`Rendered`] view.

use std::fmt::Write;

use crate::controller::{Rendered, Sidebar, LOGIN_PROMPT};
use crate::pages::{Block, TablePreview};
use crate::session::View;
use crate::utils::html::escape;

const PAGE_TITLE: &str = "Eric Brunner Portfolio";

pub fn render_document(rendered: &Rendered) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", PAGE_TITLE);
    out.push_str("</head>\n<body>\n<aside>\n");
    render_sidebar(&mut out, &rendered.sidebar);
    out.push_str("</aside>\n<main>\n");
    for block in &rendered.body {
        render_block(&mut out, block);
    }
    out.push_str("</main>\n</body>\n</html>\n");
    out
}

fn render_sidebar(out: &mut String, sidebar: &Sidebar) {
    if sidebar.logged_in {
        out.push_str("<p>You are logged in</p>\n");
        if let Some(role) = &sidebar.role {
            let _ = writeln!(out, "<p class=\"role\">Role: {}</p>", escape(role));
        }
        out.push_str("<form method=\"post\" action=\"/logout\"><button type=\"submit\">Logout</button></form>\n");
    } else {
        let _ = writeln!(out, "<p>{}</p>", LOGIN_PROMPT);
        out.push_str(concat!(
            "<form method=\"post\" action=\"/login\">\n",
            "<label>Username <input name=\"username\" type=\"text\"></label>\n",
            "<label>Password <input name=\"password\" type=\"password\"></label>\n",
            "<button type=\"submit\">Login</button>\n",
            "</form>\n"
        ));
    }
    if let Some(error) = &sidebar.login_error {
        let _ = writeln!(out, "<p class=\"error\">{}</p>", escape(error));
    }

    out.push_str("<form method=\"post\" action=\"/view\">\n<label>Select page or project: <select name=\"view\">\n");
    for view in View::ALL {
        let selected = if view == sidebar.selected_view {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "<option value=\"{}\"{}>{}</option>",
            view.key(),
            selected,
            escape(view.title())
        );
    }
    out.push_str("</select></label>\n<button type=\"submit\">Show</button>\n</form>\n");
}

fn render_block(out: &mut String, block: &Block) {
    match block {
        Block::Heading(text) => {
            let _ = writeln!(out, "<h1>{}</h1>", escape(text));
        }
        Block::Text(text) => {
            let _ = writeln!(out, "<p>{}</p>", escape(text));
        }
        Block::Error(text) => {
            let _ = writeln!(out, "<p class=\"error\">{}</p>", escape(text));
        }
        Block::Table(table) => render_table(out, table),
    }
}

fn render_table(out: &mut String, table: &TablePreview) {
    let _ = writeln!(
        out,
        "<section>\n<h2>{}</h2>\n<p>{} rows x {} columns</p>",
        escape(&table.name),
        table.rows,
        table.columns.len()
    );
    out.push_str("<table>\n<thead><tr>");
    for column in &table.columns {
        let _ = write!(
            out,
            "<th>{}<br><small>{}</small></th>",
            escape(&column.name),
            escape(&column.dtype)
        );
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.preview {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape(cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n</section>\n");
}
