//! Parsing of Myrient's HTML directory listings.
//!
//! A listing page holds a `<table id="list">`. The first row of its body links to the parent
//! directory; every other row describes one file or subdirectory, with a link in the first cell
//! whose `title` is the display name and whose `href` is the relative, URL-encoded path.

use anyhow::Error;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use quick_xml::escape::unescape;
use std::borrow::Cow;
use std::cell::RefCell;

/// One entry in a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// The display name of the entry, usually the file or directory name.
    pub title: String,
    /// The link to the entry, relative to the directory being listed.
    pub href: String,
}

impl Entry {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
        }
    }
}

#[derive(Default)]
struct Scan {
    has_body: bool,
    rows: usize,
    cells_in_row: usize,
    row_link_seen: bool,
    entries: Vec<Entry>,
}

/// Extract the entries of a listing page.
pub fn parse(html: &str) -> Result<Vec<Entry>, Error> {
    let scan = RefCell::new(Scan::default());

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("table#list tbody", |_el| {
                    scan.borrow_mut().has_body = true;
                    Ok(())
                }),
                element!("table#list tbody tr", |_el| {
                    let mut scan = scan.borrow_mut();
                    scan.rows += 1;
                    scan.cells_in_row = 0;
                    scan.row_link_seen = false;
                    Ok(())
                }),
                element!("table#list tbody tr td", |_el| {
                    scan.borrow_mut().cells_in_row += 1;
                    Ok(())
                }),
                element!("table#list tbody tr td a", |el| {
                    let mut scan = scan.borrow_mut();
                    // Only the first link of the first cell describes the entry.
                    if scan.cells_in_row != 1 || scan.row_link_seen {
                        return Ok(());
                    }
                    scan.row_link_seen = true;
                    if scan.rows < 2 {
                        return Ok(());
                    }
                    if let (Some(title), Some(href)) =
                        (el.get_attribute("title"), el.get_attribute("href"))
                    {
                        scan.entries
                            .push(Entry::new(decode_entities(&title), decode_entities(&href)));
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )?;

    let scan = scan.into_inner();
    if !scan.has_body {
        return Err(Error::msg("could not find the expected table structure"));
    }
    Ok(scan.entries)
}

/// Replace character references in an attribute value, keeping it as is if any are malformed.
fn decode_entities(value: &str) -> String {
    unescape(value)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| value.to_string())
}
