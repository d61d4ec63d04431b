//! Playback engine: walks a buffer's arena and renders every note.
//!
//! A pass resets the modified-region bound, installs the buffer transform on
//! native surfaces (explicit surfaces get device coordinates per note), then
//! visits records in allocation order. Raw data records are skipped; they
//! belong to the note recorded just before them.

pub mod bounds;
pub mod render;

pub use bounds::Bounds;
pub use render::{CallFn, RenderContext};

use crate::arena::DATA_TAG;
use crate::buffer::Buffer;
use crate::draw::{BoxGlyphs, GlyphProvider};
use crate::note::codec;
use crate::surface::Surface;
use crate::transform::TransformStrategy;
use kurbo::Affine;
use log::{debug, warn};

static BOX_GLYPHS: BoxGlyphs = BoxGlyphs;

/// Collaborators used while playing a buffer back.
#[derive(Clone, Copy)]
pub struct PlaybackOptions<'a> {
    /// Source of glyph outlines for text notes
    pub glyphs: &'a dyn GlyphProvider,
}

impl Default for PlaybackOptions<'static> {
    fn default() -> Self {
        Self {
            glyphs: &BOX_GLYPHS,
        }
    }
}

impl<'a> PlaybackOptions<'a> {
    pub fn with_glyphs(glyphs: &'a dyn GlyphProvider) -> Self {
        Self { glyphs }
    }
}

/// Plays `buffer` onto `surface` and returns the raw modified bound.
///
/// A corrupt record or undecodable payload stops the pass; everything
/// rendered before it stays registered.
pub fn play(buffer: &Buffer, surface: &mut dyn Surface, options: &PlaybackOptions<'_>) -> Bounds {
    let strategy = surface.strategy();
    if strategy == TransformStrategy::Native {
        surface.set_transform(buffer.transform().matrix());
    }

    let mut ctx = RenderContext::new(&mut *surface, buffer, options.glyphs);
    let mut rendered = 0usize;
    for record in buffer.arena().records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!("Stopping playback of buffer {}: {}", buffer.id(), err);
                break;
            }
        };
        if record.tag == DATA_TAG {
            continue;
        }
        match codec::decode(record.tag, record.payload) {
            Ok(note) => {
                ctx.render(&note);
                rendered += 1;
            }
            Err(err) => {
                warn!("Stopping playback of buffer {}: {}", buffer.id(), err);
                break;
            }
        }
    }
    let mut bounds = ctx.finish();

    if strategy == TransformStrategy::Native {
        surface.set_transform(Affine::IDENTITY);
        // Antialiased edges may bleed one pixel past the geometry
        bounds.inflate(1);
    }

    debug!(
        "Played {} note(s) from buffer {}; bound {:?}",
        rendered,
        buffer.id(),
        bounds.to_rect()
    );
    bounds
}
