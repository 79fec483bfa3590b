//! Template rendering of reference pages
//!
//! Templates use Jinja2 syntax. Each template receives one variable,
//! `groups`, holding the grouped entry collection.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{context, path_loader, Environment, ErrorKind};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::MkRefsError;

fn environment(template_dir: &Path) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(path_loader(template_dir));
    env.set_keep_trailing_newline(true);
    env.set_unknown_method_callback(minijinja_contrib::pycompat::unknown_method_callback);
    env
}

/// Render a template file with `groups` bound to the given collection
pub fn render_template<T: Serialize>(template_path: &Path, groups: &T) -> Result<String, MkRefsError> {
    if !template_path.is_file() {
        return Err(MkRefsError::TemplateNotFound(template_path.to_path_buf()));
    }

    let template_dir = template_path.parent().unwrap_or_else(|| Path::new("."));
    let name = template_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| MkRefsError::TemplateNotFound(template_path.to_path_buf()))?;

    let env = environment(template_dir);
    let template = env.get_template(name).map_err(|e| match e.kind() {
        ErrorKind::TemplateNotFound => MkRefsError::TemplateNotFound(template_path.to_path_buf()),
        _ => MkRefsError::Render {
            template: template_path.display().to_string(),
            source: e,
        },
    })?;

    template
        .render(context! { groups => groups })
        .map_err(|source| MkRefsError::Render {
            template: template_path.display().to_string(),
            source,
        })
}

/// Render a reference page and write it to `markdown_path`
///
/// The page is written only once rendering succeeds, through a sibling
/// temporary file renamed into place, so a failed render leaves any
/// previous page untouched.
///
/// # Arguments
/// * `template_path` - Jinja2 template for the page
/// * `markdown_path` - Output page, parent directories are created
/// * `groups` - Grouped entry collection
///
/// # Returns
/// The rendered Markdown
pub fn render_reference<T: Serialize>(
    template_path: &Path,
    markdown_path: &Path,
    groups: &T,
) -> Result<String, MkRefsError> {
    let markdown = render_template(template_path, groups)?;
    debug!(
        "Rendered {} ({} bytes)",
        template_path.display(),
        markdown.len()
    );

    if let Some(parent) = markdown_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(markdown_path);
    fs::write(&tmp_path, &markdown)?;
    fs::rename(&tmp_path, markdown_path)?;

    info!("Wrote {}", markdown_path.display());
    Ok(markdown)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
