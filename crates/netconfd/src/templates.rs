//! Read access to the `netconftemplates` directory.

use std::io;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Directory under the configured templates root that holds every template.
pub const TEMPLATES_SUBDIR: &str = "netconftemplates";

/// Name of the server hello template.
pub const HELLO_TEMPLATE: &str = "hello.xml";

/// Errors returned when reading templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The name escapes the template root.
    #[error("template name {name} is not a relative path inside the template root")]
    InvalidName {
        /// Offending name.
        name: String,
    },
    /// No template exists under the name.
    #[error("template {path} not found")]
    NotFound {
        /// Resolved path.
        path: Utf8PathBuf,
    },
    /// Reading the template failed.
    #[error("failed to read template {path}: {source}")]
    Io {
        /// Resolved path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Source of template text, addressed by relative name.
pub trait TemplateStore: Send + Sync {
    /// Reads the template called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when the name is invalid or the template
    /// cannot be read.
    fn read(&self, name: &str) -> Result<String, TemplateError>;
}

/// Name of the schema template for `identifier`.
#[must_use]
pub fn schema_template_name(identifier: &str) -> String {
    format!("{identifier}-schema.yang")
}

/// Name of the response template for `operation` against `datastore`.
#[must_use]
pub fn response_template_name(operation: &str, datastore: &str, file: &str) -> String {
    format!("{operation}/{datastore}/{file}")
}

/// Template store backed by `<root>/netconftemplates`.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateStore {
    root: Utf8PathBuf,
}

impl DirectoryTemplateStore {
    /// Creates a store reading from `<templates_dir>/netconftemplates`.
    #[must_use]
    pub fn new(templates_dir: &Utf8Path) -> Self {
        Self {
            root: templates_dir.join(TEMPLATES_SUBDIR),
        }
    }

    /// Directory holding the templates.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Resolves `name` below the root.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidName`] for empty names, absolute paths
    /// and names containing `..`.
    pub fn resolve(&self, name: &str) -> Result<Utf8PathBuf, TemplateError> {
        let relative = Utf8Path::new(name);
        let valid = !name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Utf8Component::Normal(_)));
        if !valid {
            return Err(TemplateError::InvalidName {
                name: name.to_owned(),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl TemplateStore for DirectoryTemplateStore {
    fn read(&self, name: &str) -> Result<String, TemplateError> {
        let path = self.resolve(name)?;
        std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                TemplateError::NotFound { path }
            } else {
                TemplateError::Io { path, source }
            }
        })
    }
}
