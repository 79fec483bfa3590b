//! API reference assembly
//!
//! Symbols come from a package manifest: a JSON or YAML file declaring the
//! package's classes with their methods, its functions and its type
//! aliases, along with each callable's source location, parameters and
//! docstring. The assembler selects the public members, builds signature
//! strings, and cross-checks docstrings against the declared parameters.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info};

use crate::docstring::{self, ParamDoc, RETURNS, YIELDS};
use crate::error::MkRefsError;
use crate::group::GroupCollection;
use crate::vocab::APIDOCS_GROUP;

#[derive(Debug, Clone, Deserialize)]
pub struct PackageManifest {
    pub package: String,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub classes: Vec<ClassManifest>,
    #[serde(default)]
    pub functions: Vec<FunctionManifest>,
    #[serde(default)]
    pub types: Vec<TypeManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassManifest {
    pub name: String,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub methods: Vec<FunctionManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionManifest {
    pub name: String,
    #[serde(default)]
    pub kind: FunctionKind,
    pub file: String,
    pub line: u32,
    #[serde(default)]
    pub params: Vec<ParamManifest>,
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default)]
    pub docstring: Option<String>,
    /// Members defined on a base class are documented there
    #[serde(default)]
    pub inherited: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamManifest {
    pub name: String,
    #[serde(default)]
    pub annotation: Option<String>,
    /// Default value as source text
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub kind: ParamKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeManifest {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    #[default]
    Method,
    Classmethod,
    Function,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    #[default]
    Positional,
    VarPositional,
    VarKeyword,
}

/// A documented symbol, keyed by its name in the rendered maps
pub trait Named {
    fn name(&self) -> &str;
}

/// Serialize symbols as a name-keyed map, keeping their order
#[allow(clippy::ptr_arg)]
fn serialize_by_name<S, T>(items: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Named + Serialize,
{
    let mut map = serializer.serialize_map(Some(items.len()))?;
    for item in items {
        map.serialize_entry(item.name(), item)?;
    }
    map.end()
}

/// Documentation of one callable
#[derive(Debug, Clone, Serialize)]
pub struct MethodDoc {
    pub name: String,
    pub kind: FunctionKind,
    pub ns_path: String,
    pub file: String,
    pub line_num: u32,
    pub src_url: String,
    pub arg_list_str: String,
    pub arg_dict: BTreeMap<String, Option<String>>,
    pub arg_docstring: String,
    pub params: Vec<ParamDoc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDoc {
    pub name: String,
    pub ns_path: String,
    pub docstring: String,
    /// Ordered by source line, rendered as the `method` map
    #[serde(rename = "method", serialize_with = "serialize_by_name")]
    pub methods: Vec<MethodDoc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeDoc {
    pub name: String,
    pub ns_path: String,
    pub definition: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageDoc {
    pub package: String,
    pub git_url: String,
    pub docstring: String,
    /// In include order, rendered as the `class` map
    #[serde(rename = "class", serialize_with = "serialize_by_name")]
    pub classes: Vec<ClassDoc>,
    #[serde(rename = "function", serialize_with = "serialize_by_name")]
    pub functions: Vec<MethodDoc>,
    #[serde(rename = "type", serialize_with = "serialize_by_name")]
    pub types: Vec<TypeDoc>,
}

impl Named for MethodDoc {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ClassDoc {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for TypeDoc {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Load a package manifest, choosing the parser by file extension
pub fn load_manifest(path: &Path) -> Result<PackageManifest, MkRefsError> {
    let content = fs::read_to_string(path).map_err(|e| MkRefsError::ConfigLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let manifest: PackageManifest = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => yaml_serde::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };

    Ok(manifest)
}

/// Clean up a type annotation as printed by the source language's runtime
///
/// `ForwardRef('X')` becomes `X`, `<class 'str'>` becomes `str`, and
/// type variables lose their `~` prefix.
pub fn fix_annotation(annotation: &str) -> String {
    let mut fixed = strip_wrapper(annotation, "ForwardRef('", "')");
    fixed = strip_wrapper(&fixed, "<class '", "'>");

    if fixed == "~AnyStr" {
        return "typing.AnyStr".to_string();
    }

    fixed.trim_start_matches('~').to_string()
}

fn strip_wrapper(text: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(open) {
        let inner = &rest[start + open.len()..];
        match inner.find(close) {
            Some(end) => {
                out.push_str(&rest[..start]);
                out.push_str(&inner[..end]);
                rest = &inner[end + close.len()..];
            }
            None => break,
        }
    }
    out.push_str(rest);

    out
}

fn is_public_method(name: &str) -> bool {
    !name.starts_with('_') || name.starts_with("__")
}

fn is_receiver(param: &ParamManifest, kind: FunctionKind) -> bool {
    param.name == "self" || (kind == FunctionKind::Classmethod && param.name == "cls")
}

/// Default value as shown in a signature; string literals use double quotes
fn default_repr(default: &str) -> String {
    let quoted = default.len() >= 2
        && ((default.starts_with('\'') && default.ends_with('\''))
            || (default.starts_with('"') && default.ends_with('"')));

    if quoted {
        default.replace('\'', "\"")
    } else {
        default.to_string()
    }
}

/// Build the signature string and the argument dict of a callable
///
/// The argument dict maps each parameter name to its annotation, and always
/// carries `yields`, plus `returns` when a return annotation is declared.
pub fn signature(func: &FunctionManifest) -> (String, BTreeMap<String, Option<String>>) {
    let mut args = Vec::new();
    let mut arg_dict = BTreeMap::new();

    for param in func.params.iter().filter(|p| !is_receiver(p, func.kind)) {
        let name = match param.kind {
            ParamKind::VarPositional => format!("*{}", param.name),
            ParamKind::VarKeyword => format!("**{}", param.name),
            ParamKind::Positional => param.name.clone(),
        };
        let arg = match &param.default {
            Some(default) => format!("{}={}", name, default_repr(default)),
            None => name,
        };
        args.push(arg);

        arg_dict.insert(
            param.name.clone(),
            param.annotation.as_deref().map(fix_annotation),
        );
    }

    arg_dict.insert(YIELDS.to_string(), None);
    if let Some(returns) = &func.returns {
        arg_dict.insert(RETURNS.to_string(), Some(fix_annotation(returns)));
    }

    (args.join(", "), arg_dict)
}

fn source_url(git_url: &str, file: &str, line: u32) -> String {
    format!(
        "{}/{}#L{}",
        git_url.trim_end_matches('/'),
        file.trim_start_matches('/'),
        line
    )
}

/// Document one callable, validating its docstring against its signature
pub fn document_function(
    func: &FunctionManifest,
    ns_path: &str,
    git_url: &str,
) -> Result<MethodDoc, MkRefsError> {
    let (arg_list_str, arg_dict) = signature(func);
    let location = format!("line {} in {}", func.line, func.file);

    let raw = func.docstring.as_deref().map(docstring::cleandoc).unwrap_or_default();
    let (arg_docstring, params) = docstring::render(&docstring::parse(&raw), &arg_dict, &location)?;

    Ok(MethodDoc {
        name: func.name.clone(),
        kind: func.kind,
        ns_path: ns_path.to_string(),
        file: func.file.clone(),
        line_num: func.line,
        src_url: source_url(git_url, &func.file, func.line),
        arg_list_str,
        arg_dict,
        arg_docstring,
        params,
    })
}

fn document_class(
    class: &ClassManifest,
    package: &str,
    git_url: &str,
) -> Result<ClassDoc, MkRefsError> {
    let ns_path = format!("{}.{}", package, class.name);

    let mut members: Vec<&FunctionManifest> = class
        .methods
        .iter()
        .filter(|m| !m.inherited && is_public_method(&m.name))
        .collect();
    members.sort_by_key(|m| m.line);

    let methods = members
        .into_iter()
        .map(|m| document_function(m, &format!("{}.{}", ns_path, m.name), git_url))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Documented class {} with {} methods", ns_path, methods.len());

    Ok(ClassDoc {
        name: class.name.clone(),
        ns_path,
        docstring: class.docstring.as_deref().map(docstring::cleandoc).unwrap_or_default(),
        methods,
    })
}

/// Document a package: the included classes, its public functions and its
/// type aliases
///
/// # Arguments
/// * `manifest` - Declared symbols of the package
/// * `git_url` - Base URL of the source tree, used for per-member links
/// * `includes` - Names of the classes to document, in page order
pub fn document_package(
    manifest: &PackageManifest,
    git_url: &str,
    includes: &[String],
) -> Result<PackageDoc, MkRefsError> {
    let package = &manifest.package;

    let classes = includes
        .iter()
        .map(|name| {
            let class = manifest
                .classes
                .iter()
                .find(|c| &c.name == name)
                .ok_or_else(|| MkRefsError::UnknownSymbol {
                    package: package.clone(),
                    name: name.clone(),
                })?;
            document_class(class, package, git_url)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut public: Vec<&FunctionManifest> = manifest
        .functions
        .iter()
        .filter(|f| !f.name.starts_with('_'))
        .collect();
    public.sort_by(|a, b| a.name.cmp(&b.name));

    let functions = public
        .into_iter()
        .map(|f| document_function(f, &format!("{}.{}", package, f.name), git_url))
        .collect::<Result<Vec<_>, _>>()?;

    // type variables are not aliases
    let mut types: Vec<TypeDoc> = manifest
        .types
        .iter()
        .filter(|t| !t.definition.starts_with('~'))
        .map(|t| TypeDoc {
            name: t.name.clone(),
            ns_path: format!("{}.{}", package, t.name),
            definition: fix_annotation(&t.definition),
        })
        .collect();
    types.sort_by(|a, b| a.name.cmp(&b.name));

    info!(
        "Documented package {}: {} classes, {} functions, {} types",
        package,
        classes.len(),
        functions.len(),
        types.len()
    );

    Ok(PackageDoc {
        package: package.clone(),
        git_url: git_url.to_string(),
        docstring: manifest.docstring.as_deref().map(docstring::cleandoc).unwrap_or_default(),
        classes,
        functions,
        types,
    })
}

/// Wrap a package document as the single `package` group
pub fn apidocs_groups(doc: PackageDoc) -> GroupCollection<PackageDoc> {
    let mut groups = BTreeMap::new();
    groups.insert(APIDOCS_GROUP.to_string(), vec![doc]);
    groups
}
