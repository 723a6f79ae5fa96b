//! `<library_animations>` channel decoding

use super::element::{Element, strip_ref};
use super::geometry::RawInput;
use super::{RawSource, parse_source};
use crate::error::{ColladaError, Result};
use crate::math::mat4s_from_row_major;
use glam::Mat4;
use log::debug;
use std::collections::HashMap;

/// Sampled matrix track for one node
#[derive(Debug, Clone)]
pub struct RawChannel {
    /// Id of the animated node
    pub target: String,
    /// Sample times in seconds
    pub times: Vec<f32>,
    /// Local node transform at each sample time
    pub transforms: Vec<Mat4>,
}

/// Collect every matrix channel of the library
///
/// Nested `<animation>` elements are flattened. Channels whose output is
/// not one 4x4 matrix per input time (per-component curves) are skipped.
pub(crate) fn parse_channels(library: &Element) -> Result<Vec<RawChannel>> {
    let mut sources: HashMap<String, RawSource> = HashMap::new();
    for element in library.descendants_named("source") {
        let source = parse_source(element)?;
        sources.insert(source.id.clone(), source);
    }

    let mut samplers: HashMap<String, Vec<RawInput>> = HashMap::new();
    for sampler in library.descendants_named("sampler") {
        let inputs = sampler
            .children_named("input")
            .map(RawInput::parse)
            .collect::<Result<Vec<_>>>()?;
        samplers.insert(sampler.attr("id").unwrap_or_default().to_string(), inputs);
    }

    let mut channels = Vec::new();
    for channel in library.descendants_named("channel") {
        let sampler_id = strip_ref(channel.attr("source").unwrap_or_default());
        let target = channel.attr("target").unwrap_or_default();
        let Some((node, _)) = target.split_once('/') else {
            debug!("Skipping channel with target '{}'", target);
            continue;
        };

        let inputs = samplers.get(sampler_id).ok_or_else(|| {
            ColladaError::InvalidReference(format!("channel references unknown sampler '{sampler_id}'"))
        })?;
        let times = sampler_source(&sources, inputs, "INPUT", sampler_id)?
            .floats
            .clone();
        let output = &sampler_source(&sources, inputs, "OUTPUT", sampler_id)?.floats;
        if times.is_empty() || output.len() != times.len() * 16 {
            debug!(
                "Skipping non-matrix channel '{}' ({} times, {} values)",
                target,
                times.len(),
                output.len()
            );
            continue;
        }

        channels.push(RawChannel {
            target: node.to_string(),
            transforms: mat4s_from_row_major(output, &format!("OUTPUT of '{sampler_id}'"))?,
            times,
        });
    }

    Ok(channels)
}

fn sampler_source<'a>(
    sources: &'a HashMap<String, RawSource>,
    inputs: &[RawInput],
    semantic: &str,
    sampler_id: &str,
) -> Result<&'a RawSource> {
    let input = inputs
        .iter()
        .find(|i| i.semantic == semantic)
        .ok_or_else(|| {
            ColladaError::MissingSection(format!("{semantic} input of sampler '{sampler_id}'"))
        })?;
    sources.get(&input.source).ok_or_else(|| {
        ColladaError::InvalidReference(format!(
            "sampler '{sampler_id}' references unknown source '{}'",
            input.source
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const LIBRARY: &str = r##"<library_animations>
      <animation id="Armature_Knee_pose">
        <animation id="inner">
          <source id="t"><float_array>0 0.5</float_array></source>
          <source id="m"><float_array>
            1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1
            1 0 0 3 0 1 0 0 0 0 1 0 0 0 0 1
          </float_array><technique_common><accessor stride="16"/></technique_common></source>
          <source id="loc"><float_array>0 1</float_array></source>
          <sampler id="s"><input semantic="INPUT" source="#t"/><input semantic="OUTPUT" source="#m"/></sampler>
          <sampler id="s2"><input semantic="INPUT" source="#t"/><input semantic="OUTPUT" source="#loc"/></sampler>
          <channel source="#s" target="Armature_Knee/transform"/>
          <channel source="#s2" target="Armature_Knee/location.X"/>
        </animation>
      </animation>
    </library_animations>"##;

    #[test]
    fn test_parse_nested_matrix_channel() {
        let library = Element::read(LIBRARY.as_bytes()).unwrap();
        let channels = parse_channels(&library).unwrap();
        assert_eq!(channels.len(), 1);

        let channel = &channels[0];
        assert_eq!(channel.target, "Armature_Knee");
        assert_eq!(channel.times, vec![0.0, 0.5]);
        let p = channel.transforms[1].transform_point3(Vec3::ZERO);
        assert!((p.x - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_sampler() {
        let xml = LIBRARY.replace("source=\"#s\" target", "source=\"#nope\" target");
        let library = Element::read(xml.as_bytes()).unwrap();
        let err = parse_channels(&library).unwrap_err();
        assert!(matches!(err, ColladaError::InvalidReference(_)));
    }
}
