//! Compile jobs: placement followed by injection.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::PathBuf;

use stripcut_common::config::CompilerConfig;
use stripcut_common::error::{StripcutError, StripcutResult};
use stripcut_processing_core::placement::{Compilation, PlacementEngine};
use stripcut_project_model::declaration::StripDescription;

use crate::injector::{InjectionStats, TimelineInjector};

/// A compile job ready to run.
#[derive(Debug, Clone)]
pub struct CompileJob {
    /// Template timeline document.
    pub timeline_path: PathBuf,

    /// Strip description file.
    pub strips_path: PathBuf,

    /// Compiler configuration.
    pub config: CompilerConfig,
}

impl CompileJob {
    /// Load the description and run placement, without touching the template.
    pub fn place(&self) -> StripcutResult<Compilation> {
        let description = StripDescription::load(&self.strips_path)
            .map_err(|e| StripcutError::description(e.to_string()))?;
        place(&self.config, &description)
    }

    /// Compile the job, writing the injected document to `output`.
    pub fn run<W: Write>(&self, output: &mut W) -> StripcutResult<InjectionStats> {
        tracing::info!(
            timeline = %self.timeline_path.display(),
            strips = %self.strips_path.display(),
            "Starting compile"
        );

        let mut compilation = self.place()?;

        if !self.timeline_path.exists() {
            return Err(StripcutError::FileNotFound {
                path: self.timeline_path.clone(),
            });
        }
        let template = BufReader::new(File::open(&self.timeline_path)?);

        let stats = inject(
            &mut compilation,
            &self.config,
            template,
            output,
            &self.timeline_path.display().to_string(),
        )?;
        tracing::info!(
            lines = stats.lines,
            tracks = stats.tracks,
            edits = stats.edits,
            keyframes = stats.keyframes,
            "Compile complete"
        );
        Ok(stats)
    }
}

/// Run placement for a parsed description.
pub fn place(config: &CompilerConfig, description: &StripDescription) -> StripcutResult<Compilation> {
    PlacementEngine::new(config)
        .place(description)
        .map_err(|e| StripcutError::description(e.to_string()))
}

/// Compile a parsed description into a template read from `template`.
pub fn compile_timeline<R: BufRead, W: Write>(
    config: &CompilerConfig,
    description: &StripDescription,
    template: R,
    output: &mut W,
) -> StripcutResult<InjectionStats> {
    let mut compilation = place(config, description)?;
    inject(&mut compilation, config, template, output, "template")
}

/// Inject a compilation, reporting undecodable template text as a timeline error.
fn inject<R: BufRead, W: Write>(
    compilation: &mut Compilation,
    config: &CompilerConfig,
    template: R,
    output: &mut W,
    source: &str,
) -> StripcutResult<InjectionStats> {
    TimelineInjector::new(compilation, config)
        .inject(template, output)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidData => StripcutError::timeline(format!("{source}: {e}")),
            _ => StripcutError::Io(e),
        })
}
