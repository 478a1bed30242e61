use quick_xml::{events::Event, Reader};
use thiserror::Error;

use super::CALL_TAG;

/// Structural parse failure of a call container. Recovered by the regex
/// fallback and never surfaced to callers.
#[derive(Debug, Error)]
pub(crate) enum MalformedResponse {
    #[error("malformed markup: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("expected root element `{expected}`, found `{found}`")]
    UnexpectedRoot { expected: String, found: String },

    #[error("unclosed element at end of input")]
    Unclosed,

    #[error("content after the root element")]
    TrailingContent,

    #[error("element `{0}` nested inside a call payload")]
    NestedElement(String),
}

/// Text payloads of the direct `<functioncall>` children of `container`,
/// in document order.
pub(crate) fn call_payloads(
    fragment: &str,
    container: &str,
) -> Result<Vec<String>, MalformedResponse> {
    let mut reader = Reader::from_str(fragment);

    let mut depth = 0usize;
    let mut root_closed = false;
    let mut current: Option<String> = None;
    let mut payloads = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if root_closed {
                    return Err(MalformedResponse::TrailingContent);
                }
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                if depth == 2 && current.is_some() {
                    return Err(MalformedResponse::NestedElement(name));
                }
                if depth == 0 && name != container {
                    return Err(MalformedResponse::UnexpectedRoot {
                        expected: container.to_string(),
                        found: name,
                    });
                }
                if depth == 1 && name == CALL_TAG {
                    current = Some(String::new());
                }
                depth += 1;
            }
            Event::Empty(start) => {
                if depth == 2 && current.is_some() {
                    return Err(MalformedResponse::NestedElement(
                        String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    ));
                }
                if depth == 1 && start.name().as_ref() == CALL_TAG.as_bytes() {
                    payloads.push(String::new());
                }
            }
            Event::End(_) => {
                depth = depth.checked_sub(1).ok_or(MalformedResponse::Unclosed)?;
                match depth {
                    0 => root_closed = true,
                    1 => payloads.extend(current.take()),
                    _ => {}
                }
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                if depth == 2 {
                    if let Some(payload) = current.as_mut() {
                        payload.push_str(&text);
                    }
                } else if depth == 0 && !text.trim().is_empty() {
                    return Err(MalformedResponse::TrailingContent);
                }
            }
            Event::CData(data) => {
                if depth == 2 {
                    if let Some(payload) = current.as_mut() {
                        payload.push_str(&String::from_utf8_lossy(&data));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 || !root_closed {
        return Err(MalformedResponse::Unclosed);
    }

    Ok(payloads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_direct_children_in_order() {
        let fragment = "<multiplefunctions>\n  <functioncall> {\"a\": 1} </functioncall>\n  <functioncall>{\"b\": 2}</functioncall>\n</multiplefunctions>";
        let payloads = call_payloads(fragment, "multiplefunctions").unwrap();
        assert_eq!(payloads, vec![" {\"a\": 1} ", "{\"b\": 2}"]);
    }

    #[test]
    fn test_unescapes_entities() {
        let fragment =
            "<singlefunction><functioncall>{\"q\": \"salt &amp; pepper\"}</functioncall></singlefunction>";
        let payloads = call_payloads(fragment, "singlefunction").unwrap();
        assert_eq!(payloads, vec!["{\"q\": \"salt & pepper\"}"]);
    }

    #[test]
    fn test_bare_ampersand_is_malformed() {
        let fragment =
            "<singlefunction><functioncall>{\"q\": \"salt & pepper\"}</functioncall></singlefunction>";
        assert!(call_payloads(fragment, "singlefunction").is_err());
    }

    #[test]
    fn test_mismatched_end_tag_is_malformed() {
        let fragment = "<singlefunction><functioncall>{}</functioncal></singlefunction>";
        assert!(call_payloads(fragment, "singlefunction").is_err());
    }

    #[test]
    fn test_markup_inside_payload_is_malformed() {
        let fragment = "<singlefunction><functioncall>{\"html\": \"<b>hi</b>\"}</functioncall></singlefunction>";
        assert!(matches!(
            call_payloads(fragment, "singlefunction"),
            Err(MalformedResponse::NestedElement(name)) if name == "b"
        ));

        let empty = "<singlefunction><functioncall>{\"html\": \"<br/>\"}</functioncall></singlefunction>";
        assert!(call_payloads(empty, "singlefunction").is_err());
    }

    #[test]
    fn test_nested_call_tags_are_not_direct_children() {
        let fragment =
            "<singlefunction><wrapper><functioncall>{}</functioncall></wrapper></singlefunction>";
        assert!(call_payloads(fragment, "singlefunction").unwrap().is_empty());
    }
}
