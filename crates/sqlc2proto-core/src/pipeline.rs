//! End-to-end generation run.
//!
//! [`Generator::run`] reads the sqlc package, applies the includes file,
//! renders every artifact and only then writes them, so a rendering error
//! leaves the output directory untouched.

use crate::config::GeneratorConfig;
use crate::emit::Templates;
use crate::emit::mapper::{MapperImports, render_mappers};
use crate::emit::proto::{ProtoFile, render_models};
use crate::emit::service::{render_services, render_split};
use crate::emit::writer::write_atomic;
use crate::error::{GenerateError, GenerateResult};
use crate::includes::{IncludesSet, dependency_additions, resolve_dependencies};
use crate::ir::{MessageDescriptor, QueryDescriptor, ServiceDescriptor};
use crate::service::{
    SynthesisContext, apply_naming, apply_pagination_names, apply_streaming, synthesize,
};
use crate::typemap::{LocalTypes, TypeMappingConfig};
use crate::walker::{WalkOptions, parse_querier, scan_package};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const MODELS_FILE: &str = "models.proto";
pub const SERVICE_FILE: &str = "service.proto";
pub const MAPPERS_DIR: &str = "mappers";
pub const MAPPERS_FILE: &str = "mappers.go";

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Artifact paths in emission order. In a dry run nothing was written
    /// and these are the paths that would have been.
    pub written: Vec<PathBuf>,
    pub dry_run: bool,
    pub messages: usize,
    pub queries: usize,
    pub services: usize,
    /// Models pulled in by the dependency closure of the includes file
    pub dependency_additions: Vec<String>,
    /// Degraded paths taken during the run
    pub warnings: Vec<String>,
}

impl GenerationReport {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// One rendered file waiting to be written.
struct Artifact {
    path: PathBuf,
    contents: String,
}

/// A validated configuration with its frozen type table and templates.
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    table: TypeMappingConfig,
    templates: Templates,
    go_module: Option<String>,
    dry_run: bool,
}

impl Generator {
    /// Validate `config`, build its type table and load its templates.
    pub fn new(config: GeneratorConfig) -> GenerateResult<Self> {
        config.validate()?;
        let table = config.type_table();
        let templates = Templates::load(config.template_dir.as_deref())?;

        Ok(Self {
            config,
            table,
            templates,
            go_module: None,
            dry_run: false,
        })
    }

    /// Compute everything but write nothing.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Module path read from `go.mod`, used when the config names none.
    pub fn with_go_module(mut self, module: Option<String>) -> Self {
        self.go_module = module;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn table(&self) -> &TypeMappingConfig {
        &self.table
    }

    /// `option go_package` of the generated files.
    pub fn go_package(&self) -> String {
        self.config.resolve_go_package(self.go_module.as_deref())
    }

    /// Run the whole pipeline.
    pub fn run(&self) -> GenerateResult<GenerationReport> {
        let mut report = GenerationReport {
            dry_run: self.dry_run,
            ..GenerationReport::default()
        };

        let (mut messages, locals) = self.scan()?;
        let mut queries = self.queries(&mut report)?;

        if let Some(includes) = self.includes(&mut report)? {
            self.filter(&includes, &mut messages, &mut queries, &mut report);
        }
        report.messages = messages.len();
        report.queries = queries.len();
        info!(
            messages = messages.len(),
            queries = queries.len(),
            "selected declarations"
        );

        let artifacts = self.render(&messages, &queries, &locals, &mut report)?;

        if !self.dry_run {
            self.remove_legacy_mappers()?;
        }
        for artifact in artifacts {
            if self.dry_run {
                info!(path = %artifact.path.display(), "would write");
            } else {
                write_atomic(&artifact.path, &artifact.contents)?;
                info!(path = %artifact.path.display(), "wrote");
            }
            report.written.push(artifact.path);
        }

        Ok(report)
    }

    fn scan(&self) -> GenerateResult<(Vec<MessageDescriptor>, LocalTypes)> {
        let options = WalkOptions {
            style: self.config.field_style,
            proto_package: &self.config.proto_package,
            table: &self.table,
        };
        let package = scan_package(&self.config.sqlc_dir, &options)?;
        debug!(messages = package.messages.len(), "walked models");
        Ok((package.messages, package.locals))
    }

    fn queries(&self, report: &mut GenerationReport) -> GenerateResult<Vec<QueryDescriptor>> {
        if !self.config.with_services {
            return Ok(Vec::new());
        }
        match parse_querier(&self.config.sqlc_dir) {
            Ok(queries) => Ok(queries),
            Err(e) if e.is_recoverable() => {
                report.warn(format!(
                    "{e}; make sure sqlc runs with emit_interface: true. Skipping service generation"
                ));
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// The includes file, or `None` when nothing should be filtered.
    fn includes(&self, report: &mut GenerationReport) -> GenerateResult<Option<IncludesSet>> {
        let Some(path) = self.config.include_file() else {
            return Ok(None);
        };
        if !path.exists() {
            report.warn(format!(
                "includes file {} not found, generating all models and queries \
                 (run `sqlc2proto getincludes` to create it)",
                path.display()
            ));
            return Ok(None);
        }

        let includes = IncludesSet::load(path)?;
        if includes.is_empty() {
            report.warn(format!(
                "includes file {} selects nothing, generating all models and queries",
                path.display()
            ));
            return Ok(None);
        }
        debug!(
            models = includes.models.len(),
            queries = includes.queries.len(),
            "loaded includes file"
        );
        Ok(Some(includes))
    }

    fn filter(
        &self,
        includes: &IncludesSet,
        messages: &mut Vec<MessageDescriptor>,
        queries: &mut Vec<QueryDescriptor>,
        report: &mut GenerationReport,
    ) {
        if !includes.queries.is_empty() {
            queries.retain(|q| includes.includes_query(&q.name));
        }
        if !includes.models.is_empty() {
            // Kept queries are roots whether listed or not.
            let roots = IncludesSet {
                models: includes.models.clone(),
                queries: queries.iter().map(|q| q.name.clone()).collect(),
            };
            let resolved = resolve_dependencies(&roots, queries, messages);
            report.dependency_additions = dependency_additions(includes, &resolved);
            for model in &report.dependency_additions {
                info!(model = %model, "included as a dependency");
            }
            messages.retain(|m| resolved.includes_model(&m.name));
        }
    }

    fn services(
        &self,
        queries: &[QueryDescriptor],
        messages: &[MessageDescriptor],
        locals: &LocalTypes,
    ) -> Vec<ServiceDescriptor> {
        let options = &self.config.service_options;
        let names = options.pagination_names();
        let ctx = SynthesisContext {
            table: &self.table,
            locals,
            pagination: &names,
        };

        let mut services = synthesize(queries, messages, &ctx);
        apply_naming(
            &mut services,
            self.config.service_naming,
            &self.config.service_prefix,
            &self.config.service_suffix,
        );
        if options.enable_streaming {
            apply_streaming(&mut services);
        }
        if options.include_pagination {
            apply_pagination_names(&mut services, &names);
        }
        services
    }

    fn render(
        &self,
        messages: &[MessageDescriptor],
        queries: &[QueryDescriptor],
        locals: &LocalTypes,
        report: &mut GenerationReport,
    ) -> GenerateResult<Vec<Artifact>> {
        let proto_dir = &self.config.proto_dir;
        let go_package = self.go_package();
        let file = ProtoFile {
            package: &self.config.proto_package,
            go_package: &go_package,
        };
        let mut artifacts = vec![Artifact {
            path: proto_dir.join(MODELS_FILE),
            contents: render_models(messages, &file, &self.templates)?,
        }];

        if self.config.with_mappers {
            let proto = self.config.proto_import(&go_package);
            let db = self.config.db_import(self.go_module.as_deref());
            let imports = MapperImports {
                proto: &proto,
                db: &db,
            };
            artifacts.push(Artifact {
                path: proto_dir.join(MAPPERS_DIR).join(MAPPERS_FILE),
                contents: render_mappers(messages, &imports, &self.templates)?,
            });
        }

        if self.config.with_services {
            if queries.is_empty() {
                report.warn(
                    "no query methods found or selected, skipping service generation".to_string(),
                );
            } else {
                let services = self.services(queries, messages, locals);
                report.services = services.len();
                if self.config.service_options.split_services {
                    for (name, contents) in
                        render_split(&services, &file, MODELS_FILE, &self.templates)?
                    {
                        artifacts.push(Artifact {
                            path: proto_dir.join(name),
                            contents,
                        });
                    }
                } else {
                    artifacts.push(Artifact {
                        path: proto_dir.join(SERVICE_FILE),
                        contents: render_services(&services, &file, MODELS_FILE, &self.templates)?,
                    });
                }
            }
        }

        Ok(artifacts)
    }

    /// Older releases wrote `mappers.go` next to the schema.
    fn remove_legacy_mappers(&self) -> GenerateResult<()> {
        if !self.config.with_mappers {
            return Ok(());
        }
        let legacy = self.config.proto_dir.join(MAPPERS_FILE);
        remove_if_present(&legacy)
    }
}

fn remove_if_present(path: &Path) -> GenerateResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed legacy file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GenerateError::io(path, e)),
    }
}
