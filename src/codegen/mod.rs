//! Code generator
//!
//! Turns a directory of table schemas into Rust modules:
//!
//! ```text
//! schemas/customer.yaml ──► out/customer_gen.rs   (rewritten every run)
//!                       └─► out/customer.rs       (written once, user-owned)
//!                           out/mod.rs            (rewritten every run)
//! ```
//!
//! Nothing is written until every schema has validated and every file has
//! rendered, so a bad schema leaves the output directory untouched.

pub mod model;
pub mod templates;

use std::path::{Path, PathBuf};

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::schema::SchemaRegistry;

pub use model::TableModel;
pub use templates::TemplateEngine;

/// A file the generator produced in memory
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFile {
    /// Path relative to the output directory
    pub path: PathBuf,
    pub content: String,
    /// Written only when absent
    pub write_once: bool,
}

/// Outcome of a generator run
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Files written on this run
    pub written: Vec<PathBuf>,
    /// User-owned files left as they were
    pub preserved: Vec<PathBuf>,
}

/// Schema-to-source generator
pub struct Generator {
    registry: SchemaRegistry,
    out_dir: PathBuf,
    runtime_crate: String,
    engine: TemplateEngine,
}

impl Generator {
    pub fn new(
        registry: SchemaRegistry,
        out_dir: impl Into<PathBuf>,
        runtime_crate: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            registry,
            out_dir: out_dir.into(),
            runtime_crate: runtime_crate.into(),
            engine: TemplateEngine::new()?,
        })
    }

    /// Load schemas and output settings from configuration
    pub fn from_config(config: &GeneratorConfig, root: &Path) -> Result<Self> {
        let registry = SchemaRegistry::load(&root.join(&config.schema_dir))?;
        Self::new(registry, root.join(&config.out_dir), config.runtime_crate.clone())
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Validate all schemas and render every output file
    pub fn render(&self) -> Result<Vec<RenderedFile>> {
        if self.registry.is_empty() {
            return Err(Error::Other("no table schemas found".to_string()));
        }
        self.registry.validate()?;

        let mut models = Vec::new();
        for table in self.registry.list() {
            let source_file = self
                .registry
                .source_of(&table.name)
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("{}.yaml", table.module_name()));
            models.push(TableModel::build(
                table,
                &self.registry,
                &source_file,
                &self.runtime_crate,
            )?);
        }

        let mut files = Vec::new();
        for model in &models {
            files.push(RenderedFile {
                path: PathBuf::from(format!("{}_gen.rs", model.module_name)),
                content: self.engine.render_table(templates::GENERATED, model)?,
                write_once: false,
            });
            files.push(RenderedFile {
                path: PathBuf::from(format!("{}.rs", model.module_name)),
                content: self.engine.render_table(templates::SKELETON, model)?,
                write_once: true,
            });
        }
        files.push(RenderedFile {
            path: PathBuf::from("mod.rs"),
            content: self.engine.render_modules(&models)?,
            write_once: false,
        });
        Ok(files)
    }

    /// Render and write everything; skeletons that already exist are kept
    pub fn run(&self) -> Result<GenerateReport> {
        let files = self.render()?;

        std::fs::create_dir_all(&self.out_dir).map_err(|source| Error::FileWriteError {
            path: self.out_dir.clone(),
            source,
        })?;

        let mut report = GenerateReport::default();
        for file in files {
            let path = self.out_dir.join(&file.path);
            if file.write_once && path.exists() {
                tracing::debug!(path = %path.display(), "keeping existing file");
                report.preserved.push(path);
                continue;
            }
            std::fs::write(&path, &file.content).map_err(|source| Error::FileWriteError {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), "wrote");
            report.written.push(path);
        }
        Ok(report)
    }
}
