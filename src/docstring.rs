//! Docstring parsing for apidocs
//!
//! A docstring is a sequence of blocks:
//!
//! ```text
//! Paragraph text is passed through verbatim.
//!
//!     name:
//! description of the parameter `name`, one or more lines
//!
//!     returns:
//! description of the return value
//! ```
//!
//! A parameter block starts with a header indented by four spaces, holding
//! a single name followed by `:`, and runs over the flush-left lines after
//! it. Anything else, indented code examples included, is paragraph text.
//! Every documented name is checked against the declared signature.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::MkRefsError;

/// Pseudo-parameter documenting a return value
pub const RETURNS: &str = "returns";

/// Pseudo-parameter documenting a generator's items
pub const YIELDS: &str = "yields";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    Param { name: String, description: String },
}

/// A documented parameter, cross-checked against the signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDoc {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    pub description: String,
}

/// Strip the indentation common to all lines after the first, then drop
/// leading and trailing blank lines
pub fn cleandoc(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();

    let indent = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let cleaned: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            if i == 0 {
                l.trim().to_string()
            } else if l.trim().is_empty() {
                String::new()
            } else {
                l.get(indent..).unwrap_or(l.trim_start()).trim_end().to_string()
            }
        })
        .collect();

    let start = cleaned.iter().position(|l| !l.is_empty()).unwrap_or(cleaned.len());
    let end = cleaned
        .iter()
        .rposition(|l| !l.is_empty())
        .map(|i| i + 1)
        .unwrap_or(start);

    cleaned[start..end].join("\n")
}

const HEADER_INDENT: &str = "    ";

/// Name of a parameter header: exactly four spaces, one token, then `:`
fn header_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(HEADER_INDENT)?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = rest.trim_end().strip_suffix(':')?;
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some(name)
}

/// Description lines start flush-left
fn is_description(line: &str) -> bool {
    line.starts_with(|c: char| !c.is_whitespace())
}

/// Split a docstring into paragraphs and parameter blocks
pub fn parse(docstring: &str) -> Vec<Block> {
    let lines: Vec<&str> = docstring.lines().collect();
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    let flush = |paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>| {
        let text = paragraph.join("\n").trim().to_string();
        if !text.is_empty() {
            blocks.push(Block::Paragraph(text));
        }
        paragraph.clear();
    };

    let mut i = 0;
    while i < lines.len() {
        let header = header_name(lines[i]);
        let has_description = lines.get(i + 1).map(|l| is_description(l)).unwrap_or(false);

        match header {
            Some(name) if has_description => {
                flush(&mut paragraph, &mut blocks);

                let mut j = i + 1;
                let mut description = Vec::new();
                while j < lines.len() && is_description(lines[j]) {
                    description.push(lines[j].trim());
                    j += 1;
                }

                blocks.push(Block::Param {
                    name: name.to_string(),
                    description: description.join(" "),
                });
                i = j;
            }
            _ => {
                paragraph.push(lines[i]);
                i += 1;
            }
        }
    }
    flush(&mut paragraph, &mut blocks);

    blocks
}

/// Render parsed blocks as Markdown, validating documented parameters
///
/// # Arguments
/// * `blocks` - Parsed docstring
/// * `arg_dict` - Declared parameter name -> type annotation
/// * `location` - Source location reported when a parameter is stale
///
/// # Returns
/// The Markdown text and the documented parameters in docstring order
pub fn render(
    blocks: &[Block],
    arg_dict: &BTreeMap<String, Option<String>>,
    location: &str,
) -> Result<(String, Vec<ParamDoc>), MkRefsError> {
    let mut md = Vec::new();
    let mut params = Vec::new();

    for block in blocks {
        match block {
            Block::Paragraph(text) => md.push(text.clone()),
            Block::Param { name, description } => {
                let annotation = match arg_dict.get(name) {
                    Some(annotation) => annotation.clone(),
                    None if name == YIELDS || name == RETURNS => None,
                    None => {
                        return Err(MkRefsError::StaleParameterDoc {
                            name: name.clone(),
                            location: location.to_string(),
                        })
                    }
                };

                let anno = annotation
                    .as_deref()
                    .map(|a| format!(" : `{}`", a))
                    .unwrap_or_default();
                let line = if name == RETURNS {
                    format!("\n  * *{}*{}  \n{}", name, anno, description)
                } else if name == YIELDS {
                    format!("\n  * *{}* :  \n{}", name, description)
                } else {
                    format!("\n  * `{}`{}  \n{}", name, anno, description)
                };
                md.push(line);

                params.push(ParamDoc {
                    name: name.clone(),
                    annotation,
                    description: description.clone(),
                });
            }
        }
    }

    Ok((md.join("\n"), params))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "Load a KG from an RDF file.

    path:
path to the RDF file

    format:
RDF serialization format;
defaults to `ttl`

    returns:
populated KG";

    fn args() -> BTreeMap<String, Option<String>> {
        let mut args = BTreeMap::new();
        args.insert("path".to_string(), Some("pathlib.Path".to_string()));
        args.insert("format".to_string(), Some("str".to_string()));
        args.insert(RETURNS.to_string(), Some("KnowledgeGraph".to_string()));
        args
    }

    #[test]
    fn test_parse_blocks() {
        let blocks = parse(DOC);

        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("Load a KG from an RDF file.".to_string()),
                Block::Param {
                    name: "path".to_string(),
                    description: "path to the RDF file".to_string()
                },
                Block::Param {
                    name: "format".to_string(),
                    description: "RDF serialization format; defaults to `ttl`".to_string()
                },
                Block::Param {
                    name: "returns".to_string(),
                    description: "populated KG".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_indented_line_without_description_is_paragraph() {
        let blocks = parse("See also:\n\n    example:\n\nmore text");
        assert!(blocks.iter().all(|b| matches!(b, Block::Paragraph(_))));
    }

    #[test]
    fn test_render_params() {
        let (md, params) = render(&parse(DOC), &args(), "line 10 in kglab.py").unwrap();

        assert!(md.starts_with("Load a KG from an RDF file."));
        assert!(md.contains("\n  * `path` : `pathlib.Path`  \npath to the RDF file"));
        assert!(md.contains("\n  * *returns* : `KnowledgeGraph`  \npopulated KG"));
        assert_eq!(params.len(), 3);
        assert_eq!(params[1].annotation.as_deref(), Some("str"));
    }

    #[test]
    fn test_stale_parameter_fails() {
        let doc = "Do a thing.\n\n    colour:\nthe colour to use";
        let err = render(&parse(doc), &args(), "line 42 in kglab.py").unwrap_err();

        match err {
            MkRefsError::StaleParameterDoc { name, location } => {
                assert_eq!(name, "colour");
                assert_eq!(location, "line 42 in kglab.py");
            }
            other => panic!("expected StaleParameterDoc, got {:?}", other),
        }
    }

    #[test]
    fn test_yields_is_always_allowed() {
        let doc = "Iterate.\n\n    yields:\neach row";
        let (md, _) = render(&parse(doc), &BTreeMap::new(), "here").unwrap();
        assert!(md.contains("\n  * *yields* :  \neach row"));
    }

    #[test]
    fn test_indented_code_example_is_paragraph() {
        let doc = "Run a query.\n\nExample:\n\n    try:\n        kg.query(sparql)\n    except ValueError:\n        pass";
        let blocks = parse(doc);

        assert!(blocks.iter().all(|b| matches!(b, Block::Paragraph(_))));
        let (md, params) = render(&blocks, &args(), "line 7 in kglab.py").unwrap();
        assert!(params.is_empty());
        assert!(md.contains("    try:\n        kg.query(sparql)"));
    }

    #[test]
    fn test_header_needs_four_space_indent() {
        assert_eq!(header_name("    path:"), Some("path"));
        assert_eq!(header_name("  path:"), None);
        assert_eq!(header_name("        path:"), None);
        assert_eq!(header_name("    except ValueError:"), None);
        assert!(is_description("text"));
        assert!(!is_description("    indented"));
        assert!(!is_description(""));
    }

    #[test]
    fn test_cleandoc() {
        let raw = "\n        Summary line.\n\n            indented:\n        body\n    ";
        assert_eq!(cleandoc(raw), "Summary line.\n\n    indented:\nbody");
    }
}
