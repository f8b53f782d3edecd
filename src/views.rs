//! HTML pages and the XML sitemap.
//!
//! Templates are embedded at compile time and filled by plain placeholder
//! substitution; every dynamic value is escaped first.

use crate::models::tab::Tab;
use chrono::NaiveDate;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const TERMS_PAGE: &str = include_str!("../templates/terms.html");

/// Home page with `tab` open and an optional message banner.
pub fn index_page(tab: Tab, message: Option<&str>) -> String {
    let banner = message
        .map(|m| format!(r#"<p class="message" role="alert">{}</p>"#, html_escape(m)))
        .unwrap_or_default();
    let (pdf2png, png2pdf) = match tab {
        Tab::Pdf2Png => (("active", ""), ("", "hidden")),
        Tab::Png2Pdf => (("", "hidden"), ("active", "")),
    };

    INDEX_TEMPLATE
        .replace("{{message}}", &banner)
        .replace("{{pdf2png_class}}", pdf2png.0)
        .replace("{{pdf2png_hidden}}", pdf2png.1)
        .replace("{{png2pdf_class}}", png2pdf.0)
        .replace("{{png2pdf_hidden}}", png2pdf.1)
}

pub fn terms_page() -> &'static str {
    TERMS_PAGE
}

/// Sitemap for `root` (must end with `/`), all pages stamped with `lastmod`.
pub fn sitemap(root: &str, lastmod: NaiveDate) -> String {
    let pages = [
        (root.to_string(), "1.0"),
        (format!("{}?tab=pdf2png", root), "0.9"),
        (format!("{}?tab=png2pdf", root), "0.9"),
        (format!("{}terms", root), "0.8"),
    ];
    let lastmod = lastmod.format("%Y-%m-%d").to_string();

    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        "\n",
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
        "\n"
    ));
    for (loc, priority) in &pages {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", xml_escape(loc)));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod));
        xml.push_str(&format!("    <priority>{}</priority>\n", priority));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>");
    xml
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
