//! sitemap.xml parsing (`<urlset>` and `<sitemapindex>`).

use quick_xml::events::Event;
use quick_xml::Reader;

/// Locations listed by one sitemap document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SitemapDoc {
    /// `<url><loc>` entries.
    pub urls: Vec<String>,
    /// `<sitemap><loc>` entries of a sitemap index.
    pub sitemaps: Vec<String>,
}

impl SitemapDoc {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.sitemaps.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Parent {
    None,
    Url,
    Sitemap,
}

/// Parse a sitemap. Malformed XML yields whatever was read before the error.
pub fn parse_sitemap(xml: &str) -> SitemapDoc {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = SitemapDoc::default();
    let mut parent = Parent::None;
    let mut in_loc = false;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => parent = Parent::Url,
                b"sitemap" => parent = Parent::Sitemap,
                b"loc" => {
                    in_loc = true;
                    text.clear();
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_loc => match t.unescape() {
                Ok(s) => text.push_str(&s),
                Err(e) => tracing::debug!("sitemap: bad text in <loc>: {e}"),
            },
            Ok(Event::CData(c)) if in_loc => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"loc" => {
                    in_loc = false;
                    let loc = text.trim().to_string();
                    if !loc.is_empty() {
                        match parent {
                            Parent::Url => doc.urls.push(loc),
                            Parent::Sitemap => doc.sitemaps.push(loc),
                            Parent::None => {}
                        }
                    }
                }
                b"url" | b"sitemap" => parent = Parent::None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(
                    "sitemap: parse error at byte {}: {e}",
                    reader.buffer_position()
                );
                break;
            }
            _ => {}
        }
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.org/</loc><lastmod>2024-01-01</lastmod></url>
  <url><loc> https://example.org/a?x=1&amp;y=2 </loc></url>
</urlset>"#;
        let doc = parse_sitemap(xml);
        assert_eq!(
            doc.urls,
            ["https://example.org/", "https://example.org/a?x=1&y=2"]
        );
        assert!(doc.sitemaps.is_empty());
    }

    #[test]
    fn parses_index() {
        let xml = "<sitemapindex><sitemap><loc>https://example.org/s1.xml</loc></sitemap></sitemapindex>";
        let doc = parse_sitemap(xml);
        assert_eq!(doc.sitemaps, ["https://example.org/s1.xml"]);
        assert!(doc.urls.is_empty());
    }

    #[test]
    fn garbage_is_empty() {
        assert!(parse_sitemap("not xml at all <<<").is_empty());
    }
}
