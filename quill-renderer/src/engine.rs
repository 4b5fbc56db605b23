//! Tera rendering engine: [`TemplateEngine`] and the per-input [`Renderer`].
//!
//! Tera needs every template registered before rendering, so the engine
//! walks each parsed template for the names it references and resolves them
//! through the same [`DependencyLoader`] as the entry template:
//!
//! | Tag                                   | Followed          |
//! |---------------------------------------|-------------------|
//! | `{% extends "base.html" %}`           | parent            |
//! | `{% include "a.html" %}`              | the file          |
//! | `{% include ["a.html", "b.html"] %}`  | first that exists |
//! | `{% import "macros.html" as m %}`     | the macro file    |
//!
//! References that do not resolve are left for Tera to report when it
//! renders, so a missing include fails the render with the engine's message.

use std::collections::HashSet;
use std::path::Path;

use tera::ast::Node;
use tera::{Template, Tera};

use quill_core::RenderContext;

use crate::context::{build_context, Bindings};
use crate::error::{chain_message, parse_error_line, RenderError};
use crate::functions;
use crate::loader::{input_dir, DependencyLoader, DependencySet, LoadedTemplate};

// ---------------------------------------------------------------------------
// Reference discovery
// ---------------------------------------------------------------------------

fn parse(loaded: &LoadedTemplate) -> Result<Template, RenderError> {
    let path = loaded.path.display().to_string();
    Template::new(&loaded.name, Some(path), &loaded.source).map_err(|e| {
        let message = chain_message(&e);
        RenderError::Syntax {
            path: loaded.path.clone(),
            line: parse_error_line(&message),
            source_text: loaded.source.clone(),
            message,
        }
    })
}

/// Candidate lists referenced by `template`; each list loads its first hit.
fn references(template: &Template) -> Vec<Vec<String>> {
    let mut refs = Vec::new();
    if let Some(parent) = &template.parent {
        refs.push(vec![parent.clone()]);
    }
    for (file, _namespace) in &template.imported_macro_files {
        refs.push(vec![file.clone()]);
    }
    collect_includes(&template.ast, &mut refs);
    for definition in template.macros.values() {
        collect_includes(&definition.body, &mut refs);
    }
    refs
}

fn collect_includes(nodes: &[Node], refs: &mut Vec<Vec<String>>) {
    for node in nodes {
        match node {
            Node::Include(_, names, _ignore_missing) => refs.push(names.clone()),
            Node::Block(_, block, _) => collect_includes(&block.body, refs),
            Node::MacroDefinition(_, definition, _) => collect_includes(&definition.body, refs),
            Node::FilterSection(_, section, _) => collect_includes(&section.body, refs),
            Node::Forloop(_, forloop, _) => {
                collect_includes(&forloop.body, refs);
                if let Some(empty) = &forloop.empty_body {
                    collect_includes(empty, refs);
                }
            }
            Node::If(branches, _) => {
                for (_, _, body) in &branches.conditions {
                    collect_includes(body, refs);
                }
                if let Some((_, body)) = &branches.otherwise {
                    collect_includes(body, refs);
                }
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera instance whose template sources all come from one [`DependencyLoader`].
///
/// Autoescaping is off: inputs are arbitrary text files, not only HTML.
pub struct TemplateEngine {
    tera: Tera,
    loader: DependencyLoader,
}

impl TemplateEngine {
    pub fn new(loader: DependencyLoader) -> Self {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        TemplateEngine { tera, loader }
    }

    /// Expose `read_file` / `import_module`, resolving against `indir`.
    pub fn register_capabilities(&mut self, indir: &Path) {
        functions::register(&mut self.tera, &self.loader, indir);
    }

    pub fn loader(&self) -> &DependencyLoader {
        &self.loader
    }

    /// Load `name` and every template it transitively references.
    pub fn load(&mut self, name: &str) -> Result<(), RenderError> {
        let Some(entry) = self.loader.load(name)? else {
            return Err(RenderError::TemplateNotFound {
                name: name.to_string(),
                searched: self.loader.search_dirs().to_vec(),
            });
        };

        let mut seen: HashSet<String> = HashSet::from([name.to_string()]);
        let mut pending = vec![entry];
        let mut sources = Vec::new();

        while let Some(loaded) = pending.pop() {
            let template = parse(&loaded)?;
            for candidates in references(&template) {
                let Some(hit) = candidates.iter().find(|c| self.loader.find(c).is_some()) else {
                    tracing::debug!(
                        from = %loaded.name,
                        "unresolved reference {:?}",
                        candidates
                    );
                    continue;
                };
                if !seen.insert(hit.clone()) {
                    continue;
                }
                if let Some(next) = self.loader.load(hit)? {
                    pending.push(next);
                }
            }
            sources.push((loaded.name, loaded.source));
        }

        self.tera
            .add_raw_templates(sources)
            .map_err(|e| RenderError::from_tera(&e))
    }

    pub fn render(&self, name: &str, ctx: &tera::Context) -> Result<String, RenderError> {
        self.tera
            .render(name, ctx)
            .map_err(|e| RenderError::from_tera(&e))
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders one input file, tracking every file it consults.
///
/// The dependency set is scoped to this value; nothing is global.
pub struct Renderer {
    engine: TemplateEngine,
    entry: String,
}

impl Renderer {
    /// Environment for `infile`: the default search path, capabilities
    /// rooted at the input's directory, and `basename(infile)` loaded.
    pub fn for_input(infile: &Path) -> Result<Self, RenderError> {
        let loader = DependencyLoader::for_input(infile);
        Self::with_loader(infile, loader)
    }

    /// Same as [`Renderer::for_input`] with a caller-chosen search path.
    pub fn with_loader(infile: &Path, loader: DependencyLoader) -> Result<Self, RenderError> {
        let entry = infile
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut engine = TemplateEngine::new(loader);
        engine.register_capabilities(&input_dir(infile));
        engine.load(&entry)?;
        Ok(Renderer { engine, entry })
    }

    /// Render with metadata `data` and caller `bindings`. The output is
    /// returned exactly as the template produced it.
    pub fn render(&self, data: &RenderContext, bindings: &Bindings) -> Result<String, RenderError> {
        let ctx = build_context(data, bindings)?;
        self.engine.render(&self.entry, &ctx)
    }

    /// Files consulted so far: templates loaded plus capability targets.
    pub fn dependencies(&self) -> DependencySet {
        self.engine.loader().dependencies()
    }
}
