use std::path::PathBuf;

use clap::{Parser, Subcommand};
use optical_ekg_core::{
    validate_patterns, AppConfig, EkgCatalog, FrameReport, LessonCatalog, LessonSession,
    SceneDescriptor,
};
use tracing_subscriber::EnvFilter;

fn main() -> optical_ekg_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Modules => run_modules(),
        Commands::Walk {
            module,
            pattern,
            max_frames,
        } => run_walk(&config, &module, pattern.as_deref(), max_frames),
        Commands::Validate => run_validate(),
    }
}

fn run_modules() -> optical_ekg_core::Result<()> {
    let lessons = LessonCatalog::builtin()?;
    for module in lessons.modules() {
        println!("{} - {} ({} steps)", module.id, module.title, module.steps.len());
        for (index, step) in module.steps.iter().enumerate() {
            println!("  {:>2}. {} - {}", index + 1, step.id, step.title);
        }
    }
    Ok(())
}

fn run_walk(
    config: &AppConfig,
    module: &str,
    pattern: Option<&str>,
    max_frames: u32,
) -> optical_ekg_core::Result<()> {
    tracing::info!(module, ?pattern, "walking lesson module");

    let mut session = LessonSession::builtin(config)?;
    if let Some(pattern) = pattern {
        session.select_ekg_pattern(pattern)?;
    }
    session.try_select_module(module)?;

    loop {
        let report = run_frames(&mut session, config.frame_interval(), max_frames);
        if let Some(step) = session.store().current_step() {
            tracing::info!(
                step = %step.id,
                title = %step.title,
                highlighted = ?session.projector().applied(),
                camera = ?report.camera.position,
                trace_percent = report.trace_percent,
                trace_end = ?report.trace_end,
                progress = session.store().lesson_progress(),
                "step settled"
            );
        }
        if !session.advance_step() {
            break;
        }
    }

    session.select_module(None);
    let report = run_frames(&mut session, config.frame_interval(), max_frames);
    tracing::info!(
        camera = ?report.camera.position,
        frames = session.clock().frames,
        seconds = session.clock().time_seconds,
        "returned to default view"
    );
    Ok(())
}

/// Ticks until the camera and the EKG trace stop moving, or the frame budget
/// runs out.
fn run_frames(session: &mut LessonSession, interval: f32, max_frames: u32) -> FrameReport {
    let mut report = session.tick(0.0);
    for _ in 0..max_frames {
        report = session.tick(interval);
        let trace_done = (report.trace_percent - session.store().trace_progress()).abs()
            <= f32::EPSILON;
        if !report.animating && trace_done {
            break;
        }
    }
    report
}

fn run_validate() -> optical_ekg_core::Result<()> {
    let lessons = LessonCatalog::builtin()?;
    let patterns = EkgCatalog::builtin()?;
    let scene = SceneDescriptor::heart();

    scene.validate_lessons(&lessons)?;
    validate_patterns(&patterns, &lessons)?;
    tracing::info!(
        modules = lessons.modules().len(),
        patterns = patterns.patterns().len(),
        structures = scene.structures.len(),
        "catalogs are consistent"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive cardiac conduction lessons", long_about = None)]
struct Cli {
    /// Optional JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the lesson modules and their steps.
    Modules,
    /// Step through a lesson module, logging highlights, camera and EKG progress.
    Walk {
        /// Module to walk through.
        #[arg(short, long, default_value = "electrical-conduction-components")]
        module: String,
        /// EKG pattern to display instead of the configured default.
        #[arg(short, long)]
        pattern: Option<String>,
        /// Frame budget per step.
        #[arg(long, default_value_t = 600)]
        max_frames: u32,
    },
    /// Check lesson and EKG catalogs against the heart model.
    Validate,
}
