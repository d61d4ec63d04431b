use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notebuf::config::Backend;
use notebuf::draw::GlyphProvider;
use notebuf::playback::PlaybackOptions;
use notebuf::surface::RasterSurface;
use notebuf::{Config, Rect, Scene, Session};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "notebuf")]
#[command(version, about = "Retained 2D command buffer with emulated and native playback")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a scene file into a retained buffer and play it onto a surface
    Render {
        /// Scene description (TOML)
        scene: PathBuf,

        /// Image to write (PNG, or PPM for a .ppm extension)
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,

        /// Surface implementation to play onto
        #[arg(long, value_enum)]
        backend: Option<Backend>,

        /// Surface width in pixels
        #[arg(long)]
        width: Option<i32>,

        /// Surface height in pixels
        #[arg(long)]
        height: Option<i32>,

        /// Config file to use instead of ~/.config/notebuf/config.toml
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            scene,
            output,
            backend,
            width,
            height,
            config,
        } => {
            let mut config = match config {
                Some(path) => Config::load_from(&path)?,
                None => Config::load()?,
            };
            if let Some(backend) = backend {
                config.render.backend = backend;
            }
            if let Some(width) = width {
                config.render.width = width;
            }
            if let Some(height) = height {
                config.render.height = height;
            }
            config.validate_and_clamp();

            let region = render(&config, &scene, output.as_deref())?;
            match region {
                Some(rect) => println!(
                    "modified region: {},{} {}x{}",
                    rect.x, rect.y, rect.width, rect.height
                ),
                None => println!("modified region: empty"),
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cairo")]
fn glyphs() -> notebuf::draw::PangoGlyphs {
    notebuf::draw::PangoGlyphs
}

#[cfg(not(feature = "cairo"))]
fn glyphs() -> notebuf::draw::BoxGlyphs {
    notebuf::draw::BoxGlyphs
}

fn render(config: &Config, scene_path: &Path, output: Option<&Path>) -> Result<Option<Rect>> {
    let scene = Scene::load(scene_path)
        .with_context(|| format!("Failed to load scene {}", scene_path.display()))?;

    let mut session = Session::from_config(config);
    let id = scene.record(&mut session)?;

    let glyphs = glyphs();
    let options = PlaybackOptions::with_glyphs(&glyphs as &dyn GlyphProvider);
    let (width, height) = (config.render.width, config.render.height);
    let background = config.render.background.to_color();

    log::info!(
        "Playing buffer {} onto a {}x{} {:?} surface",
        id,
        width,
        height,
        config.render.backend
    );

    match config.render.backend {
        Backend::Emulated => {
            let mut surface = RasterSurface::with_background(width, height, background)?;
            let region = session.play(id, &mut surface, &options)?;
            if let Some(path) = output {
                write_raster(&surface, path)?;
                log::info!("Wrote {}", path.display());
            }
            Ok(region)
        }
        Backend::Native => render_native(&mut session, id, config, &options, output),
    }
}

fn write_raster(surface: &RasterSurface, path: &Path) -> Result<()> {
    let wants_ppm = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ppm"));
    if wants_ppm {
        surface.write_ppm(path)?;
    } else {
        write_png(surface, path)?;
    }
    Ok(())
}

#[cfg(feature = "cairo")]
fn write_png(surface: &RasterSurface, path: &Path) -> Result<()> {
    surface.write_png(path)?;
    Ok(())
}

#[cfg(not(feature = "cairo"))]
fn write_png(surface: &RasterSurface, path: &Path) -> Result<()> {
    log::warn!("PNG output requires the cairo feature; writing PPM data");
    surface.write_ppm(path)?;
    Ok(())
}

#[cfg(feature = "cairo")]
fn render_native(
    session: &mut Session,
    id: u32,
    config: &Config,
    options: &PlaybackOptions<'_>,
    output: Option<&Path>,
) -> Result<Option<Rect>> {
    let mut surface =
        notebuf::surface::CairoSurface::new(config.render.width, config.render.height)?;
    surface.fill_background(config.render.background.to_color());
    let region = session.play(id, &mut surface, options)?;
    if let Some(path) = output {
        surface.write_png(path)?;
        log::info!("Wrote {}", path.display());
    }
    Ok(region)
}

#[cfg(not(feature = "cairo"))]
fn render_native(
    _session: &mut Session,
    _id: u32,
    _config: &Config,
    _options: &PlaybackOptions<'_>,
    _output: Option<&Path>,
) -> Result<Option<Rect>> {
    anyhow::bail!("The native backend requires the cairo feature")
}
