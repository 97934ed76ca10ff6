use haven_core::Response;

use crate::config::FallbackPageConfig;

/// The synthesized unavailability document.
///
/// Rendered once at construction; every fallback response shares the same
/// body.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPage {
    html: String,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

impl FallbackPage {
    /// Renders the page from its text.
    pub fn new(config: &FallbackPageConfig) -> Self {
        let mut html = String::from("<!DOCTYPE html>\n<html>\n");
        html.push_str(&format!(
            "<head><meta charset=\"utf-8\"><title>{}</title></head>\n",
            escape(&config.title)
        ));
        html.push_str("<body style=\"text-align: center; padding: 50px; background: #f2f2f7;\">\n");
        html.push_str(&format!(
            "  <h2 style=\"color: #333;\">{}</h2>\n",
            escape(&config.heading)
        ));
        for line in &config.lines {
            html.push_str(&format!("  <p style=\"color: #666;\">{}</p>\n", escape(line)));
        }
        html.push_str("</body>\n</html>\n");
        Self { html }
    }

    /// The rendered document.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// A `200 OK` `text/html` response carrying the page.
    pub fn response(&self) -> Response {
        Response::html(self.html.clone())
    }
}

impl Default for FallbackPage {
    fn default() -> Self {
        Self::new(&FallbackPageConfig::default())
    }
}
