///! Some utility functions

use minidom::Element;

/// Walks an XML tree and returns every element that has the given name
pub fn find_elems<S: AsRef<str>>(root: &Element, searched_name: S) -> Vec<&Element> {
    let searched_name = searched_name.as_ref();
    let mut elems: Vec<&Element> = Vec::new();

    for el in root.children() {
        if el.name() == searched_name {
            elems.push(el);
        } else {
            let ret = find_elems(el, searched_name);
            elems.extend(ret);
        }
    }
    elems
}

/// Walks an XML tree until it finds an elements with the given name
pub fn find_elem<S: AsRef<str>>(root: &Element, searched_name: S) -> Option<&Element> {
    let searched_name = searched_name.as_ref();
    if root.name() == searched_name {
        return Some(root);
    }

    for el in root.children() {
        if el.name() == searched_name {
            return Some(el);
        } else {
            let ret = find_elem(el, searched_name);
            if ret.is_some() {
                return ret;
            }
        }
    }
    None
}

/// Returns the trimmed text of the first element with the given name, if it is not empty
pub fn find_text<S: AsRef<str>>(root: &Element, searched_name: S) -> Option<String> {
    find_elem(root, searched_name)
        .map(|el| el.text().trim().to_string())
        .filter(|text| text.is_empty() == false)
}

/// Returns the content of a `<![CDATA[...]]>` section, if `text` is one
pub fn strip_cdata(text: &str) -> Option<&str> {
    text.trim()
        .strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
}

/// Turn raw XML text content into plain text: remove a CDATA wrapper, or resolve XML entities (`&lt;`, `&#13;`...)
pub fn xml_text_to_plain(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(inner) = strip_cdata(trimmed) {
        return inner.to_string();
    }

    match quick_xml::escape::unescape(trimmed) {
        Ok(text) => text.trim().to_string(),
        Err(err) => {
            log::debug!("Unable to unescape XML text ({}), keeping it as is", err);
            trimmed.to_string()
        }
    }
}
