use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use thiserror::Error;

use crate::feed::types::NewsItem;
use crate::util::clean_snippet;

/// Errors produced while extracting items from feed XML.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The XML itself is malformed.
    #[error("XML parse error: {0}")]
    Xml(String),
    /// Well-formed (or empty) content with no RSS, RDF or Atom root, e.g. an
    /// HTML error page returned by the proxy.
    #[error("Document is not an RSS or Atom feed")]
    NotAFeed,
}

/// Per-entry fields, filled from the first matching child element.
#[derive(Default)]
struct EntryFields {
    title: Option<String>,
    link: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    description: Option<String>,
    content: Option<String>,
}

impl EntryFields {
    fn into_item(self, source: &str) -> NewsItem {
        let snippet_source = self.description.or(self.content).unwrap_or_default();
        NewsItem {
            source: source.to_string(),
            title: self.title.unwrap_or_default().trim().to_string(),
            link: self.link.unwrap_or_default().trim().to_string(),
            published_at: self
                .published
                .or(self.updated)
                .unwrap_or_default()
                .trim()
                .to_string(),
            snippet: clean_snippet(&snippet_source),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Published,
    Updated,
    Description,
    Content,
}

impl Field {
    /// Maps an entry child element to the field it fills.
    ///
    /// Core elements only count when unprefixed, so extension elements such
    /// as `media:content` or `media:title` never fill a core field.
    /// `pubDate`/`description` are RSS, `dc:date` is Dublin Core (RSS 1.0),
    /// `published`/`updated`/`summary`/`content` are Atom.
    fn from_element(name: QName<'_>, atom: bool) -> Option<Self> {
        let local = name.local_name();
        match (name.prefix().map(|p| p.into_inner()), local.into_inner()) {
            (None, b"title") => Some(Field::Title),
            (None, b"link") => Some(Field::Link),
            (None, b"pubDate") if !atom => Some(Field::Published),
            (None, b"description") if !atom => Some(Field::Description),
            (Some(b"dc"), b"date") => Some(Field::Published),
            (None, b"published") if atom => Some(Field::Published),
            (None, b"updated") if atom => Some(Field::Updated),
            (None, b"summary") if atom => Some(Field::Description),
            (None, b"content") if atom => Some(Field::Content),
            _ => None,
        }
    }

    fn slot<'a>(&self, fields: &'a mut EntryFields) -> &'a mut Option<String> {
        match self {
            Field::Title => &mut fields.title,
            Field::Link => &mut fields.link,
            Field::Published => &mut fields.published,
            Field::Updated => &mut fields.updated,
            Field::Description => &mut fields.description,
            Field::Content => &mut fields.content,
        }
    }
}

/// Extracts [`NewsItem`]s from an RSS 2.0, RSS 1.0 or Atom document.
///
/// Only direct children of each `<item>`/`<entry>` are read, and the first
/// occurrence of a field wins. Missing fields become empty strings rather
/// than dropping the entry. Atom `<link>` elements contribute their `href`
/// attribute, preferring `rel="alternate"` (or no `rel`).
///
/// # Errors
///
/// - [`ParseError::Xml`] for ill-formed XML (mismatched tags, bad syntax)
/// - [`ParseError::NotAFeed`] when no `rss`, `RDF` or `feed` root element is present
///
/// SEC-002: quick-xml (0.37) never expands `<!ENTITY>` declarations; custom
/// entity references fail to unescape and fall back to the raw text.
pub fn parse_feed(source: &str, xml: &str) -> Result<Vec<NewsItem>, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut saw_feed_root = false;
    // Root is <feed>, so Atom-only element names apply
    let mut atom = false;
    let mut depth: usize = 0;
    // Depth of the open <item>/<entry>, if any
    let mut entry_depth: Option<usize> = None;
    let mut fields = EntryFields::default();
    // Field currently collecting text, with the depth of its element
    let mut current: Option<(Field, usize)> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let name = e.local_name();
                if depth == 1 && is_feed_root(name.as_ref()) {
                    saw_feed_root = true;
                    atom = name.as_ref() == b"feed";
                }

                match entry_depth {
                    None if is_entry(name.as_ref()) => {
                        entry_depth = Some(depth);
                        fields = EntryFields::default();
                    }
                    Some(d) if depth == d + 1 => {
                        if let Some(field) = Field::from_element(e.name(), atom) {
                            if field == Field::Link {
                                take_link_href(&e, &mut fields);
                            }
                            current = Some((field, depth));
                            text.clear();
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 && is_feed_root(e.local_name().as_ref()) {
                    saw_feed_root = true;
                }
                if let Some(d) = entry_depth {
                    if depth == d && e.name().as_ref() == b"link" {
                        take_link_href(&e, &mut fields);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if current.is_some() {
                    match t.unescape() {
                        Ok(s) => push_segment(&mut text, &s),
                        Err(_) => push_segment(&mut text, &String::from_utf8_lossy(&t)),
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if current.is_some() {
                    push_segment(&mut text, &String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(_)) => {
                if let Some((field, field_depth)) = current {
                    if depth == field_depth {
                        let slot = field.slot(&mut fields);
                        if slot.is_none() && !text.trim().is_empty() {
                            *slot = Some(std::mem::take(&mut text));
                        }
                        text.clear();
                        current = None;
                    }
                }
                if entry_depth == Some(depth) {
                    items.push(std::mem::take(&mut fields).into_item(source));
                    entry_depth = None;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
    }

    if !saw_feed_root {
        return Err(ParseError::NotAFeed);
    }

    Ok(items)
}

fn is_feed_root(name: &[u8]) -> bool {
    matches!(name, b"rss" | b"RDF" | b"feed")
}

fn is_entry(name: &[u8]) -> bool {
    matches!(name, b"item" | b"entry")
}

/// Text and CDATA segments of one element are joined with a space so that
/// `trim_text` never glues two words together.
fn push_segment(text: &mut String, segment: &str) {
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(segment);
}

/// Records an Atom link's `href` if no link has been chosen yet.
fn take_link_href(e: &BytesStart<'_>, fields: &mut EntryFields) {
    if fields.link.is_some() {
        return;
    }

    let mut href = None;
    let mut rel_ok = true;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"href" => href = attr.unescape_value().ok().map(|v| v.into_owned()),
            b"rel" => {
                rel_ok = attr
                    .unescape_value()
                    .map(|v| v == "alternate")
                    .unwrap_or(false)
            }
            _ => {}
        }
    }

    if rel_ok {
        if let Some(href) = href.filter(|h| !h.trim().is_empty()) {
            fields.link = Some(href);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>BBC News - London</title>
    <link>https://www.bbc.co.uk/news/england/london</link>
    <item>
      <title><![CDATA[  Tube strike called off after late talks ]]></title>
      <description><![CDATA[<p>Walkouts on the <b>Central line</b>
          were   due to start on Monday.</p>]]></description>
      <link>https://www.bbc.co.uk/news/articles/abc</link>
      <pubDate>Tue, 14 Oct 2025 09:30:00 GMT</pubDate>
      <media:thumbnail url="https://ichef.bbci.co.uk/x.jpg"/>
    </item>
    <item>
      <title>Croydon tram works &amp; diversions</title>
      <description>Replacement buses &lt;b&gt;all weekend&lt;/b&gt;</description>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>London Assembly</title>
  <entry>
    <title>Mayor confirms ULEZ grant extension</title>
    <link rel="self" href="https://example.gov/self"/>
    <link rel="alternate" href="https://example.gov/news/ulez"/>
    <updated>2025-10-13T08:00:00Z</updated>
    <published>2025-10-12T08:00:00Z</published>
    <summary type="html">&lt;p&gt;Scrappage payments rise&lt;/p&gt;</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_items() {
        let items = parse_feed("BBC London", RSS).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.source, "BBC London");
        assert_eq!(first.title, "Tube strike called off after late talks");
        assert_eq!(first.link, "https://www.bbc.co.uk/news/articles/abc");
        assert_eq!(first.published_at, "Tue, 14 Oct 2025 09:30:00 GMT");
        assert_eq!(
            first.snippet,
            "Walkouts on the Central line were due to start on Monday."
        );
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let items = parse_feed("BBC London", RSS).unwrap();
        let second = &items[1];
        assert_eq!(second.title, "Croydon tram works & diversions");
        assert_eq!(second.link, "");
        assert_eq!(second.published_at, "");
        assert_eq!(second.snippet, "Replacement buses all weekend");
    }

    #[test]
    fn test_channel_fields_are_not_items() {
        let items = parse_feed("BBC London", RSS).unwrap();
        assert!(items.iter().all(|i| i.title != "BBC News - London"));
    }

    #[test]
    fn test_parse_atom_entry() {
        let items = parse_feed("London.gov.uk News", ATOM).unwrap();
        assert_eq!(items.len(), 1);
        let entry = &items[0];
        assert_eq!(entry.title, "Mayor confirms ULEZ grant extension");
        assert_eq!(entry.link, "https://example.gov/news/ulez");
        // published wins over updated
        assert_eq!(entry.published_at, "2025-10-12T08:00:00Z");
        assert_eq!(entry.snippet, "Scrappage payments rise");
    }

    #[test]
    fn test_parse_rdf_dc_date() {
        let rdf = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns="http://purl.org/rss/1.0/"
         xmlns:dc="http://purl.org/dc/elements/1.1/">
  <item rdf:about="https://example.com/1">
    <title>Heathrow expansion consultation opens</title>
    <link>https://example.com/1</link>
    <dc:date>2025-10-10T12:00:00Z</dc:date>
  </item>
</rdf:RDF>"#;
        let items = parse_feed("Bucks Free Press", rdf).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].published_at, "2025-10-10T12:00:00Z");
    }

    #[test]
    fn test_empty_channel_is_ok() {
        let empty = r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#;
        assert!(parse_feed("Kent Live", empty).unwrap().is_empty());
    }

    #[test]
    fn test_mismatched_tags_are_parse_errors() {
        let broken = "<rss><channel><item><title>x</item></channel></rss>";
        assert!(matches!(
            parse_feed("Kent Live", broken),
            Err(ParseError::Xml(_))
        ));
    }

    #[test]
    fn test_non_feed_documents_rejected() {
        assert!(matches!(
            parse_feed("Kent Live", "Service temporarily unavailable"),
            Err(ParseError::NotAFeed)
        ));
        assert!(matches!(
            parse_feed("Kent Live", "<html><body>Blocked</body></html>"),
            Err(ParseError::NotAFeed)
        ));
    }

    #[test]
    fn test_media_extension_elements_are_not_core_fields() {
        let xml = r#"<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <item>
      <media:title>Photo: flooded underpass</media:title>
      <title>Kent flood warning issued</title>
      <media:content url="https://img.example/1.jpg">
        <media:credit>Getty Images</media:credit>
        <media:description>Aerial view</media:description>
      </media:content>
      <atom:link rel="self" href="https://example.com/self"/>
      <link>https://example.com/flood</link>
    </item>
  </channel>
</rss>"#;
        let items = parse_feed("Kent Live", xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Kent flood warning issued");
        assert_eq!(items[0].link, "https://example.com/flood");
        assert_eq!(items[0].snippet, "");
    }

    #[test]
    fn test_atom_names_ignored_in_rss() {
        let xml = r#"<rss><channel><item>
            <title>Barnet library saved</title>
            <summary>not an rss field</summary>
            <updated>2025-10-10T12:00:00Z</updated>
        </item></channel></rss>"#;
        let items = parse_feed("Barnet Times", xml).unwrap();
        assert_eq!(items[0].snippet, "");
        assert_eq!(items[0].published_at, "");
    }

    #[test]
    fn test_unknown_entity_falls_back_to_raw_text() {
        let xml = r#"<rss><channel><item><title>Fares&nbsp;rise</title></item></channel></rss>"#;
        let items = parse_feed("TfL News", xml).unwrap();
        assert_eq!(items[0].title, "Fares&nbsp;rise");
    }
}
