//! List placed strips.

use stripcut_render_engine::CompileJob;

pub fn run(job: &CompileJob) -> anyhow::Result<()> {
    let compilation = job
        .place()
        .map_err(|e| anyhow::anyhow!("Failed to place strips: {e}"))?;

    eprintln!("Placed {} strip(s):", compilation.strip_count());
    for strip in compilation.records() {
        eprintln!(
            "  [{:>3}] ch {:<3} {:>7}..{:<7} {}",
            strip.id,
            strip.channel,
            strip.frame_final_start,
            strip.frame_final_end(),
            strip
        );
    }
    eprintln!();

    for channel in compilation.channels.iter() {
        eprintln!("  Channel {}: {} strip(s)", channel.id, channel.len());
    }
    eprintln!();

    Ok(())
}
