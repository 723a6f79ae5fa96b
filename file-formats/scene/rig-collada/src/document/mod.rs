//! Scene document parsing
//!
//! Reads a COLLADA-style XML document and extracts the sections the skinning
//! pipeline needs into a [`RawDocument`]:
//! - the skinned geometry (sources, vertex block, triangle corners)
//! - the skin controller (joint table, weights, `vcount`/`v` influences)
//! - the skeleton node tree below the configured root node
//! - matrix animation channels, when the document carries any
//!
//! The raw document is a transient value: [`crate::builder::build`] consumes
//! it to produce a [`crate::ModelSpecification`].
//!
//! # Example
//!
//! ```rust,no_run
//! use rig_collada::document::DocumentParser;
//! use rig_collada::LoadConfig;
//!
//! let config = LoadConfig::default();
//! let raw = DocumentParser::new(&config).parse("character.dae")?;
//! println!("{} joints in skin", raw.skin.joint_names.len());
//! # Ok::<(), rig_collada::ColladaError>(())
//! ```

mod animation;
mod controller;
pub mod element;
mod geometry;
mod scene;

pub use animation::RawChannel;
pub use controller::{RawInfluence, RawSkin};
pub use geometry::{CornerIndices, RawGeometry, RawInput};
pub use scene::RawNode;

use crate::config::LoadConfig;
use crate::error::{ColladaError, Result};
use crate::math::{parse_floats, parse_indices, parse_names};
use element::Element;
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Axis the document declares as "up"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpAxis {
    X,
    #[default]
    Y,
    Z,
}

impl UpAxis {
    fn from_text(text: &str) -> Self {
        match text.trim() {
            "Z_UP" => Self::Z,
            "X_UP" => Self::X,
            _ => Self::Y,
        }
    }
}

/// A `<source>` block: a float or name array plus its accessor stride
#[derive(Debug, Clone, Default)]
pub struct RawSource {
    pub id: String,
    pub floats: Vec<f32>,
    pub names: Vec<String>,
    pub stride: usize,
}

/// Everything the model builder needs, as read from the document
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Declared up axis (`<asset><up_axis>`)
    pub up_axis: UpAxis,
    /// The geometry the skin controller deforms
    pub geometry: RawGeometry,
    /// The skin controller
    pub skin: RawSkin,
    /// Root joint node of the skeleton
    pub skeleton: RawNode,
    /// Matrix animation channels (empty when the document has none)
    pub channels: Vec<RawChannel>,
}

/// Parse a document with the default [`LoadConfig`]
pub fn parse<P: AsRef<Path>>(path: P) -> Result<RawDocument> {
    DocumentParser::new(&LoadConfig::default()).parse(path)
}

/// Document parser bound to a load configuration
///
/// The configuration supplies the name of the node under which the
/// skeleton lives.
#[derive(Debug, Clone, Copy)]
pub struct DocumentParser<'a> {
    config: &'a LoadConfig,
}

impl<'a> DocumentParser<'a> {
    pub fn new(config: &'a LoadConfig) -> Self {
        Self { config }
    }

    /// Open and parse the document at `path`
    pub fn parse<P: AsRef<Path>>(&self, path: P) -> Result<RawDocument> {
        let path = path.as_ref();
        debug!("Parsing scene document {}", path.display());
        let file = File::open(path)?;
        self.parse_reader(BufReader::new(file))
    }

    /// Parse a document held in memory
    pub fn parse_str(&self, text: &str) -> Result<RawDocument> {
        self.parse_reader(text.as_bytes())
    }

    /// Parse a document from any reader
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<RawDocument> {
        let root = Element::read(reader)?;
        self.parse_root(&root)
    }

    fn parse_root(&self, root: &Element) -> Result<RawDocument> {
        if root.name != "COLLADA" {
            return Err(ColladaError::ParseError(format!(
                "root element is <{}>, expected <COLLADA>",
                root.name
            )));
        }

        let up_axis = root
            .path(&["asset", "up_axis"])
            .map_or(UpAxis::Y, |e| UpAxis::from_text(&e.text));
        debug!("Up axis: {:?}", up_axis);

        let skin = controller::parse_skin(root.require_child("library_controllers")?)?;
        debug!(
            "Skin '{}' binds {} joints over {} vertices",
            skin.id,
            skin.joint_names.len(),
            skin.vertex_influences.len()
        );

        let geometry =
            geometry::parse_geometry(root.require_child("library_geometries")?, &skin.geometry)?;
        debug!(
            "Geometry '{}': {} sources, {} triangle corners",
            geometry.id,
            geometry.sources.len(),
            geometry.corners.len()
        );

        let visual_scene = root
            .path(&["library_visual_scenes", "visual_scene"])
            .ok_or_else(|| ColladaError::MissingSection("<visual_scene>".to_string()))?;
        let skeleton = scene::parse_skeleton(visual_scene, &self.config.skeleton_root)?;
        debug!("Skeleton root node: {:?}", skeleton.id);

        let channels = match root.child("library_animations") {
            Some(library) => animation::parse_channels(library)?,
            None => Vec::new(),
        };
        debug!("Found {} animation channels", channels.len());

        Ok(RawDocument {
            up_axis,
            geometry,
            skin,
            skeleton,
            channels,
        })
    }
}

/// Decode a `<source>` element
pub(crate) fn parse_source(element: &Element) -> Result<RawSource> {
    let id = element.attr("id").unwrap_or_default().to_string();

    let floats = match element.child("float_array") {
        Some(array) => parse_floats(&array.text, &format!("source '{id}'"))?,
        None => Vec::new(),
    };
    let names = element
        .child("Name_array")
        .or_else(|| element.child("IDREF_array"))
        .map(|array| parse_names(&array.text))
        .unwrap_or_default();

    let stride = match element
        .path(&["technique_common", "accessor"])
        .and_then(|accessor| accessor.attr("stride"))
    {
        Some(text) => parse_indices(text, &format!("stride of source '{id}'"))?
            .first()
            .copied()
            .unwrap_or(1),
        None => 1,
    };

    Ok(RawSource {
        id,
        floats,
        names,
        stride,
    })
}
