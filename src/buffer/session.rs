//! A set of buffers, one of which is selected for emission.

use super::{Buffer, BufferError};
use crate::arena::Arena;
use crate::config::Config;
use crate::draw::{FontDescriptor, FontId, FontTable};
use crate::note::AttribState;
use crate::playback::PlaybackOptions;
use crate::surface::Surface;
use crate::util::Rect;
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Arena settings applied to every buffer a session opens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaSettings {
    pub block_size: usize,
    pub growth_factor: f64,
    pub max_bytes: Option<usize>,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            block_size: crate::arena::DEFAULT_BLOCK_SIZE,
            growth_factor: crate::arena::DEFAULT_GROWTH_FACTOR,
            max_bytes: None,
        }
    }
}

/// Owns the open buffers and tracks which one is active.
///
/// Attribute defaults and the font table are shared: they are copied into a
/// buffer when it is opened and are buffer-local afterwards.
#[derive(Debug, Default)]
pub struct Session {
    buffers: BTreeMap<u32, Buffer>,
    active: Option<u32>,
    defaults: AttribState,
    fonts: Arc<FontTable>,
    arena: ArenaSettings,
}

impl Session {
    pub fn new(defaults: AttribState, fonts: FontTable, arena: ArenaSettings) -> Self {
        Self {
            buffers: BTreeMap::new(),
            active: None,
            defaults,
            fonts: Arc::new(fonts),
            arena,
        }
    }

    /// Builds a session from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let (defaults, fonts) = config.attrib_defaults();
        Self::new(defaults, fonts, config.arena.settings())
    }

    pub fn defaults(&self) -> &AttribState {
        &self.defaults
    }

    /// Replaces the defaults used by buffers opened from now on.
    pub fn set_defaults(&mut self, defaults: AttribState) {
        self.defaults = defaults;
    }

    pub fn fonts(&self) -> &FontTable {
        &self.fonts
    }

    /// Registers a font and shares the updated table with every open buffer.
    pub fn register_font(&mut self, font: FontDescriptor) -> FontId {
        let id = Arc::make_mut(&mut self.fonts).register(font);
        for buffer in self.buffers.values_mut() {
            buffer.set_fonts(Arc::clone(&self.fonts));
        }
        id
    }

    /// Opens buffer `id` and selects it.
    ///
    /// Opening an id that is already open clears that buffer and selects it.
    pub fn open_buffer(&mut self, id: u32, retain: bool) -> &mut Buffer {
        self.active = Some(id);
        let buffer = self.buffers.entry(id).or_insert_with(|| {
            info!("Opening buffer {} (retained: {})", id, retain);
            Buffer::with_parts(
                id,
                retain,
                Arena::with_config(
                    self.arena.block_size,
                    self.arena.growth_factor,
                    self.arena.max_bytes,
                ),
                self.defaults.clone(),
                Arc::clone(&self.fonts),
            )
        });
        if !buffer.arena().is_empty() || buffer.is_poisoned() {
            buffer.clear();
        }
        buffer
    }

    /// Clears the notes of buffer `id`, keeping its memory.
    pub fn clear_buffer(&mut self, id: u32) -> Result<(), BufferError> {
        self.buffer_mut(id)?.clear();
        Ok(())
    }

    /// Closes buffer `id`, releasing its memory. Closing the active buffer
    /// leaves no buffer selected.
    pub fn close_buffer(&mut self, id: u32) -> Result<(), BufferError> {
        self.buffers
            .remove(&id)
            .ok_or(BufferError::UnknownBuffer(id))?;
        if self.active == Some(id) {
            self.active = None;
        }
        debug!("Closed buffer {}", id);
        Ok(())
    }

    /// Makes buffer `id` the target of emission.
    pub fn select_buffer(&mut self, id: u32) -> Result<(), BufferError> {
        if !self.buffers.contains_key(&id) {
            return Err(BufferError::UnknownBuffer(id));
        }
        self.active = Some(id);
        Ok(())
    }

    pub fn active_id(&self) -> Option<u32> {
        self.active
    }

    /// The selected buffer.
    pub fn active_mut(&mut self) -> Result<&mut Buffer, BufferError> {
        let id = self.active.ok_or(BufferError::NoActiveBuffer)?;
        self.buffer_mut(id)
    }

    pub fn buffer(&self, id: u32) -> Result<&Buffer, BufferError> {
        self.buffers.get(&id).ok_or(BufferError::UnknownBuffer(id))
    }

    pub fn buffer_mut(&mut self, id: u32) -> Result<&mut Buffer, BufferError> {
        self.buffers
            .get_mut(&id)
            .ok_or(BufferError::UnknownBuffer(id))
    }

    /// Ids of the open buffers in ascending order.
    pub fn buffer_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.buffers.keys().copied()
    }

    /// Closes every buffer that was not opened as retained.
    pub fn end_frame(&mut self) {
        let before = self.buffers.len();
        self.buffers.retain(|_, buffer| buffer.is_retained());
        if self.active.is_some_and(|id| !self.buffers.contains_key(&id)) {
            self.active = None;
        }
        let closed = before - self.buffers.len();
        if closed > 0 {
            debug!("End of frame closed {} transient buffer(s)", closed);
        }
    }

    /// Plays buffer `id` onto `surface`.
    pub fn play(
        &mut self,
        id: u32,
        surface: &mut dyn Surface,
        options: &PlaybackOptions<'_>,
    ) -> Result<Option<Rect>, BufferError> {
        Ok(self.buffer_mut(id)?.play(surface, options))
    }
}
