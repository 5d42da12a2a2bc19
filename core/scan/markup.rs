use log;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

pub const RECORD_TAG: &[u8] = b"record";
pub const TEMPLATE_TAG: &[u8] = b"template";
pub const MISSING_ID: &str = "no-id";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkupSummary {
    pub root: String,
    /// One entry per `record` element in document order; `no-id` when the
    /// element carries no `id` attribute.
    pub record_ids: Vec<String>,
    pub templates: usize,
}

impl MarkupSummary {
    pub fn records(&self) -> usize {
        self.record_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_ids.is_empty() && self.templates == 0
    }
}

/// Counts `record` and `template` descendants of a data file whose root tag
/// is one of `recognized_roots`. Malformed documents and unrecognized roots
/// yield `None`.
pub fn scan_markup(text: &str, recognized_roots: &[String]) -> Option<MarkupSummary> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = Reader::from_str(text);
    let mut summary = MarkupSummary::default();
    let mut root: Option<String> = None;
    let mut depth: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                visit_element(&e, depth, &mut root, &mut summary)?;
                depth += 1;
            }
            Ok(Event::Empty(e)) => visit_element(&e, depth, &mut root, &mut summary)?,
            Ok(Event::End(_)) => {
                depth = depth.checked_sub(1)?;
            }
            Ok(Event::Text(t)) => {
                if depth == 0 && t.iter().any(|b| !b.is_ascii_whitespace()) {
                    log::debug!("Markup scan: text outside the root element");
                    return None;
                }
                if let Err(e) = t.unescape() {
                    log::debug!("Markup scan: bad text content: {}", e);
                    return None;
                }
            }
            Ok(Event::CData(_)) if depth == 0 => return None,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                log::debug!(
                    "Markup scan failed at position {}: {}",
                    reader.buffer_position(),
                    e
                );
                return None;
            }
        }
    }

    if depth != 0 {
        log::debug!("Markup scan: {} unclosed element(s)", depth);
        return None;
    }

    let root = root?;
    if !recognized_roots.iter().any(|r| *r == root) {
        log::trace!("Markup root <{}> is not a recognized data root", root);
        return None;
    }
    summary.root = root;
    Some(summary)
}

fn visit_element(
    element: &BytesStart,
    depth: usize,
    root: &mut Option<String>,
    summary: &mut MarkupSummary,
) -> Option<()> {
    for attr in element.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(e) => {
                log::debug!("Markup scan: bad attribute: {}", e);
                return None;
            }
        };
        if let Err(e) = attr.unescape_value() {
            log::debug!("Markup scan: bad attribute value: {}", e);
            return None;
        }
    }

    let name = element.name();
    if depth == 0 {
        if root.is_some() {
            log::debug!("Markup scan: more than one root element");
            return None;
        }
        *root = Some(String::from_utf8_lossy(name.as_ref()).into_owned());
        return Some(());
    }

    if name.as_ref() == RECORD_TAG {
        let id = match element.try_get_attribute("id").ok()? {
            Some(attr) => attr.unescape_value().ok()?.into_owned(),
            None => MISSING_ID.to_string(),
        };
        summary.record_ids.push(id);
    } else if name.as_ref() == TEMPLATE_TAG {
        summary.templates += 1;
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> Vec<String> {
        vec!["odoo".to_string(), "openerp".to_string()]
    }

    #[test]
    fn counts_records_and_templates() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<odoo>
    <data noupdate="1">
        <record id="view_a" model="ir.ui.view"><field name="name">a</field></record>
        <record model="res.groups"/>
    </data>
    <template id="portal_layout"><div/></template>
</odoo>
"#;
        let summary = scan_markup(xml, &roots()).unwrap();
        assert_eq!(summary.root, "odoo");
        assert_eq!(summary.record_ids, vec!["view_a", "no-id"]);
        assert_eq!(summary.templates, 1);
    }

    #[test]
    fn legacy_root_is_recognized() {
        let xml = r#"<openerp><data><record id="x" model="m"/></data></openerp>"#;
        assert_eq!(scan_markup(xml, &roots()).unwrap().records(), 1);
    }

    #[test]
    fn other_roots_are_ignored() {
        assert!(scan_markup("<templates><t t-name='x'/></templates>", &roots()).is_none());
    }

    #[test]
    fn malformed_documents_yield_none() {
        assert!(scan_markup("<odoo><record id='a'></odoo>", &roots()).is_none());
        assert!(scan_markup("<odoo><record id='a'/>", &roots()).is_none());
        assert!(scan_markup("<odoo/><odoo/>", &roots()).is_none());
        assert!(scan_markup("", &roots()).is_none());
        assert!(scan_markup("junk <odoo/>", &roots()).is_none());
    }

    #[test]
    fn undefined_entities_make_the_document_malformed() {
        let text = r#"<odoo><record id="a"><field name="x">a&nbsp;b</field></record></odoo>"#;
        assert!(scan_markup(text, &roots()).is_none());
        let attr = r#"<odoo><record id="a" string="x&nbsp;y"/></odoo>"#;
        assert!(scan_markup(attr, &roots()).is_none());
        let predefined = r#"<odoo><record id="a"><field name="x">a&lt;b&#160;</field></record></odoo>"#;
        assert_eq!(scan_markup(predefined, &roots()).unwrap().records(), 1);
    }

    #[test]
    fn escaped_ids_are_unescaped() {
        let xml = r#"<odoo><record id="a&amp;b" model="m"/></odoo>"#;
        assert_eq!(scan_markup(xml, &roots()).unwrap().record_ids, vec!["a&b"]);
    }
}
