//! TOML scene descriptions replayed into a retained buffer.
//!
//! A scene names the buffer to record into, the buffer transform, extra
//! fonts and an ordered list of commands. Every command maps onto one
//! [`Buffer`] emission call. Angles are given in degrees.
//!
//! ```toml
//! buffer = 7
//!
//! [transform]
//! pivot = [5.0, 5.0]
//! scale = [1.0, 1.0]
//! angle = 0.0
//!
//! [[command]]
//! op = "pen"
//! width = 3
//! color = "red"
//! dash = [4, 2]
//!
//! [[command]]
//! op = "polygon"
//! points = [[0, 0], [10, 0], [10, 10], [0, 10]]
//! ```

use crate::buffer::{Buffer, BufferError, Session};
use crate::config::ColorSpec;
use crate::draw::{FontDescriptor, FontId};
use crate::note::{FillRule, FillStyle, JoinStyle};
use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Failed to read scene {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Command {index} ({op}) failed: {source}")]
    Command {
        index: usize,
        op: &'static str,
        #[source]
        source: BufferError,
    },
}

/// Buffer-wide transform of a scene.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformSpec {
    #[serde(default)]
    pub pivot: [f64; 2],
    #[serde(default, rename = "move")]
    pub offset: [f64; 2],
    #[serde(default = "unit_scale")]
    pub scale: [f64; 2],
    /// Degrees
    #[serde(default)]
    pub angle: f64,
}

impl Default for TransformSpec {
    fn default() -> Self {
        Self {
            pivot: [0.0, 0.0],
            offset: [0.0, 0.0],
            scale: unit_scale(),
            angle: 0.0,
        }
    }
}

fn unit_scale() -> [f64; 2] {
    [1.0, 1.0]
}

/// A font registered before the commands run; the first one gets id 1.
#[derive(Debug, Clone, Deserialize)]
pub struct FontSpec {
    pub family: String,
    #[serde(default = "normal")]
    pub weight: String,
    #[serde(default = "normal")]
    pub style: String,
    pub size: f64,
}

fn normal() -> String {
    "normal".to_string()
}

fn one() -> f64 {
    1.0
}

/// Outline or filled variant of an arc command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArcKind {
    #[default]
    Arc,
    Chord,
    Sector,
}

/// One emission call.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Command {
    Point {
        at: [i32; 2],
    },
    MarkerPoint {
        at: [i32; 2],
    },
    Line {
        from: [i32; 2],
        to: [i32; 2],
    },
    Ellipse {
        center: [i32; 2],
        radii: [u32; 2],
        #[serde(default)]
        filled: bool,
    },
    Arc {
        center: [i32; 2],
        radii: [u32; 2],
        start: f64,
        sweep: f64,
        #[serde(default)]
        kind: ArcKind,
        #[serde(default)]
        filled: bool,
    },
    Polyline {
        points: Vec<[i32; 2]>,
    },
    Polygon {
        points: Vec<[i32; 2]>,
    },
    MarkerRun {
        points: Vec<[i32; 2]>,
        #[serde(default)]
        closed: bool,
    },
    BeginPolyline {
        max: u32,
    },
    BeginPolygon {
        max: u32,
    },
    AddPoint {
        at: [i32; 2],
    },
    BeginMarker {
        at: [i32; 2],
        #[serde(default)]
        angle: f64,
    },
    EndMarker,
    Image {
        path: PathBuf,
        at: [i32; 2],
        #[serde(default = "one")]
        scale: f64,
    },
    Text {
        at: [i32; 2],
        text: String,
        #[serde(default)]
        angle: f64,
        #[serde(default)]
        outline: bool,
        /// Draws a frame box inflated by this many half text heights
        #[serde(default)]
        frame: Option<f64>,
    },
    Pen {
        width: Option<u32>,
        color: Option<ColorSpec>,
        dash: Option<Vec<u32>>,
    },
    Join {
        style: JoinStyle,
    },
    Fill {
        color: Option<ColorSpec>,
        style: Option<FillStyle>,
        draw_edge: Option<bool>,
    },
    FillRule {
        rule: FillRule,
    },
    TextStyle {
        #[serde(default)]
        font: u32,
        color: Option<ColorSpec>,
        #[serde(default)]
        slant: f64,
        #[serde(default = "one")]
        h_scale: f64,
        #[serde(default = "one")]
        v_scale: f64,
        #[serde(default)]
        underline: bool,
    },
    Marker {
        color: Option<ColorSpec>,
        width: Option<u32>,
        #[serde(default)]
        filled: bool,
    },
    Clear,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Point { .. } => "point",
            Command::MarkerPoint { .. } => "marker-point",
            Command::Line { .. } => "line",
            Command::Ellipse { .. } => "ellipse",
            Command::Arc { .. } => "arc",
            Command::Polyline { .. } => "polyline",
            Command::Polygon { .. } => "polygon",
            Command::MarkerRun { .. } => "marker-run",
            Command::BeginPolyline { .. } => "begin-polyline",
            Command::BeginPolygon { .. } => "begin-polygon",
            Command::AddPoint { .. } => "add-point",
            Command::BeginMarker { .. } => "begin-marker",
            Command::EndMarker => "end-marker",
            Command::Image { .. } => "image",
            Command::Text { .. } => "text",
            Command::Pen { .. } => "pen",
            Command::Join { .. } => "join",
            Command::Fill { .. } => "fill",
            Command::FillRule { .. } => "fill-rule",
            Command::TextStyle { .. } => "text-style",
            Command::Marker { .. } => "marker",
            Command::Clear => "clear",
        }
    }

    /// Issues the command against `buffer`. Relative image paths resolve
    /// against `base_dir`.
    pub fn apply(&self, buffer: &mut Buffer, base_dir: &Path) -> Result<(), BufferError> {
        match self {
            Command::Point { at: [x, y] } => buffer.point(*x, *y),
            Command::MarkerPoint { at: [x, y] } => buffer.marker_point(*x, *y),
            Command::Line {
                from: [x1, y1],
                to: [x2, y2],
            } => buffer.line(*x1, *y1, *x2, *y2),
            Command::Ellipse {
                center: [x, y],
                radii: [rx, ry],
                filled,
            } => {
                if *filled {
                    buffer.poly_ellipse(*x, *y, *rx, *ry)
                } else {
                    buffer.ellipse(*x, *y, *rx, *ry)
                }
            }
            Command::Arc {
                center: [x, y],
                radii: [rx, ry],
                start,
                sweep,
                kind,
                filled,
            } => {
                let (start, sweep) = (start.to_radians(), sweep.to_radians());
                match (*kind, *filled) {
                    (ArcKind::Arc, false) => buffer.arc(*x, *y, *rx, *ry, start, sweep),
                    (ArcKind::Arc, true) => buffer.poly_arc(*x, *y, *rx, *ry, start, sweep),
                    (ArcKind::Chord, false) => buffer.chord(*x, *y, *rx, *ry, start, sweep),
                    (ArcKind::Chord, true) => buffer.poly_chord(*x, *y, *rx, *ry, start, sweep),
                    (ArcKind::Sector, false) => buffer.sector(*x, *y, *rx, *ry, start, sweep),
                    (ArcKind::Sector, true) => buffer.poly_sector(*x, *y, *rx, *ry, start, sweep),
                }
            }
            Command::Polyline { points } => buffer.polyline(&pairs(points)),
            Command::Polygon { points } => buffer.polygon(&pairs(points)),
            Command::MarkerRun { points, closed } => buffer.marker_run(&pairs(points), *closed),
            Command::BeginPolyline { max } => buffer.begin_polyline(*max),
            Command::BeginPolygon { max } => buffer.begin_polygon(*max),
            Command::AddPoint { at: [x, y] } => buffer.add_point(*x, *y).map(drop),
            Command::BeginMarker { at: [x, y], angle } => {
                buffer.begin_marker(*x, *y, angle.to_radians())
            }
            Command::EndMarker => buffer.end_marker(),
            Command::Image {
                path,
                at: [x, y],
                scale,
            } => buffer.image_file(&base_dir.join(path), *x, *y, *scale),
            Command::Text {
                at: [x, y],
                text,
                angle,
                outline,
                frame,
            } => match frame {
                Some(margin) => {
                    buffer.poly_text(*x, *y, angle.to_radians(), *margin, text, *outline)
                }
                None => buffer.text(*x, *y, angle.to_radians(), text, *outline),
            },
            Command::Pen { width, color, dash } => {
                let line = &buffer.state().line;
                let width = width.unwrap_or(line.width);
                let color = color.as_ref().map_or(line.color, ColorSpec::to_color);
                let dash = dash.clone().unwrap_or_else(|| line.dash.clone());
                buffer.set_line_attrib(width, color, Some(dash.as_slice()))
            }
            Command::Join { style } => buffer.set_line_join(*style),
            Command::Fill {
                color,
                style,
                draw_edge,
            } => {
                let fill = buffer.state().fill;
                buffer.set_fill_attrib(
                    color.as_ref().map_or(fill.color, ColorSpec::to_color),
                    style.unwrap_or(fill.style),
                    draw_edge.unwrap_or(fill.draw_edge),
                )
            }
            Command::FillRule { rule } => buffer.set_fill_rule(*rule),
            Command::TextStyle {
                font,
                color,
                slant,
                h_scale,
                v_scale,
                underline,
            } => {
                let current = buffer.state().text.color;
                buffer.set_text_attrib(
                    FontId(*font),
                    color.as_ref().map_or(current, ColorSpec::to_color),
                    *slant,
                    *h_scale,
                    *v_scale,
                    *underline,
                )
            }
            Command::Marker {
                color,
                width,
                filled,
            } => {
                let marker = buffer.state().marker;
                buffer.set_marker_attrib(
                    color.as_ref().map_or(marker.color, ColorSpec::to_color),
                    width.unwrap_or(marker.width),
                    *filled,
                )
            }
            Command::Clear => {
                buffer.clear();
                Ok(())
            }
        }
    }
}

fn pairs(points: &[[i32; 2]]) -> Vec<(i32, i32)> {
    points.iter().map(|&[x, y]| (x, y)).collect()
}

/// A parsed scene file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    /// Id of the retained buffer the scene records into
    #[serde(default = "default_buffer_id")]
    pub buffer: u32,

    #[serde(default)]
    pub transform: TransformSpec,

    #[serde(default, rename = "font")]
    pub fonts: Vec<FontSpec>,

    #[serde(default, rename = "command")]
    pub commands: Vec<Command>,

    /// Directory relative image paths resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_buffer_id() -> u32 {
    1
}

impl std::str::FromStr for Scene {
    type Err = SceneError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(source)?)
    }
}

impl Scene {
    /// Reads and parses a scene file.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let source = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scene: Scene = source.parse()?;
        scene.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        info!(
            "Loaded scene {} ({} command(s))",
            path.display(),
            scene.commands.len()
        );
        Ok(scene)
    }

    /// Registers the scene's fonts, opens its buffer as retained and
    /// records every command. Returns the buffer id.
    pub fn record(&self, session: &mut Session) -> Result<u32, SceneError> {
        for font in &self.fonts {
            let id = session.register_font(FontDescriptor::new(
                font.family.clone(),
                font.weight.clone(),
                font.style.clone(),
                font.size,
            ));
            debug!("Registered font {:?} as {:?}", font.family, id);
        }

        let buffer = session.open_buffer(self.buffer, true);
        let [px, py] = self.transform.pivot;
        let [dx, dy] = self.transform.offset;
        let [sx, sy] = self.transform.scale;
        buffer.set_pivot(px, py);
        buffer.set_move(dx, dy);
        buffer.set_scale(sx, sy);
        buffer.set_angle(self.transform.angle.to_radians());

        for (index, command) in self.commands.iter().enumerate() {
            command
                .apply(buffer, &self.base_dir)
                .map_err(|source| SceneError::Command {
                    index,
                    op: command.name(),
                    source,
                })?;
        }
        Ok(self.buffer)
    }
}
