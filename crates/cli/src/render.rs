//! Output rendering. Pure string templating over the resolved records.

use std::fmt::Write;
use std::str::FromStr;

use hollowbeak_core::Error;

use crate::pipeline::TitleRecord;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Html,
    Space,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "space" => Ok(Self::Space),
            other => Err(Error::InvalidOutputFormat(other.to_string())),
        }
    }
}

/// Render records in the chosen format.
pub fn render(format: OutputFormat, records: &[TitleRecord]) -> String {
    match format {
        OutputFormat::Markdown => render_markdown(records),
        OutputFormat::Html => render_html(records),
        OutputFormat::Space => render_space_delimited(records),
    }
}

fn render_markdown(records: &[TitleRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let _ = writeln!(out, "[{}]({})\n", record.title, record.url);
    }
    out
}

fn render_html(records: &[TitleRecord]) -> String {
    let mut out = String::from("<ul>\n");
    for record in records {
        let _ = writeln!(out, "  <li><a href=\"{}\">{}</a></li>", record.url, record.title);
    }
    out.push_str("</ul>");
    out
}

fn render_space_delimited(records: &[TitleRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let _ = writeln!(out, "{} {}", record.url, record.title);
    }
    out
}
