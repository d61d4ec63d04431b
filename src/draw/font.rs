//! Font descriptors and the per-session font table.

/// Font configuration for text rendering.
///
/// Describes which font to use, including family name, weight, style and
/// size. Text notes only store a [`FontId`]; the descriptor is looked up in the
/// buffer's [`FontTable`] when glyph outlines are requested.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    /// Font family name (e.g., "Sans", "Monospace", "JetBrains Mono")
    /// Reference installed system fonts by name
    pub family: String,

    /// Font weight (e.g., "normal", "bold", "light" or numeric 100-900)
    pub weight: String,

    /// Font style (e.g., "normal", "italic", "oblique")
    pub style: String,

    /// Font size in device pixels
    pub size: f64,
}

impl FontDescriptor {
    /// Creates a new font descriptor with the specified parameters.
    pub fn new(family: String, weight: String, style: String, size: f64) -> Self {
        Self {
            family,
            weight,
            style,
            size,
        }
    }

    /// Converts this font descriptor to a Pango font description string.
    ///
    /// Format: "Family Style Weight Size"
    /// Example: "Sans Bold 32" or "Monospace Italic 24"
    pub fn to_pango_string(&self) -> String {
        let mut parts = vec![self.family.clone()];

        if self.style.to_lowercase() != "normal" {
            parts.push(capitalize_first(&self.style));
        }

        if self.weight.to_lowercase() != "normal" {
            parts.push(capitalize_first(&self.weight));
        }

        parts.push(format!("{}", self.size.round() as i32));

        parts.join(" ")
    }
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: "Sans".to_string(),
            weight: "normal".to_string(),
            style: "normal".to_string(),
            size: 16.0,
        }
    }
}

/// Capitalizes the first letter of a string.
fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Index of a font registered in a [`FontTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FontId(pub u32);

/// Fonts known to a session. Font `0` always exists.
#[derive(Debug, Clone)]
pub struct FontTable {
    fonts: Vec<FontDescriptor>,
}

impl FontTable {
    /// Creates a table whose font `0` is `default`.
    pub fn new(default: FontDescriptor) -> Self {
        Self {
            fonts: vec![default],
        }
    }

    /// Registers a font and returns its id.
    pub fn register(&mut self, font: FontDescriptor) -> FontId {
        if let Some(index) = self.fonts.iter().position(|known| *known == font) {
            return FontId(index as u32);
        }
        self.fonts.push(font);
        FontId((self.fonts.len() - 1) as u32)
    }

    /// Looks up a font by id.
    pub fn get(&self, id: FontId) -> Option<&FontDescriptor> {
        self.fonts.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

impl Default for FontTable {
    fn default() -> Self {
        Self::new(FontDescriptor::default())
    }
}
