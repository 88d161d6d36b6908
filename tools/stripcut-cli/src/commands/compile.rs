//! Compile the template and strip description into a timeline document.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use stripcut_render_engine::CompileJob;

pub fn run(job: &CompileJob, output: Option<PathBuf>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            compile(job, &mut writer)?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            compile(job, &mut writer)?;
        }
    }
    Ok(())
}

fn compile<W: Write>(job: &CompileJob, writer: &mut W) -> anyhow::Result<()> {
    let stats = job
        .run(writer)
        .map_err(|e| anyhow::anyhow!("Failed to compile timeline: {e}"))?;
    if stats.edits == 0 && stats.keyframes == 0 {
        tracing::warn!("no track title matched a compiled channel; document is unchanged");
    }
    Ok(())
}
