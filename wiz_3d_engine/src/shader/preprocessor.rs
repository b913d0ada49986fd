/// Splits a shader document into per-stage text blocks
///
/// A document holds one block per stage, each introduced by a marker line:
///
/// ```text
/// #type vertex
/// ...vertex stage text...
/// #type pixel
/// ...pixel stage text...
/// ```
///
/// Text before the first marker is ignored.

use rustc_hash::FxHashMap;
use crate::device::ShaderStage;
use crate::error::{Error, Result};
use crate::engine_warn;

const MARKER: &str = "#type";

/// Text of one stage block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSource {
    pub stage: ShaderStage,
    pub text: String,
    /// Document line number of the first line of `text`
    pub first_line: usize,
}

/// Both stage blocks of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSources {
    pub vertex: StageSource,
    pub pixel: StageSource,
}

impl StageSources {
    pub fn get(&self, stage: ShaderStage) -> &StageSource {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Pixel => &self.pixel,
        }
    }
}

/// Map a marker keyword to its stage
fn stage_for_keyword(keyword: &str) -> Option<ShaderStage> {
    match keyword {
        "vertex" => Some(ShaderStage::Vertex),
        "pixel" | "fragment" => Some(ShaderStage::Pixel),
        _ => None,
    }
}

/// Parse a marker line, returning `None` for ordinary lines
fn parse_marker(line: &str) -> Option<Result<ShaderStage>> {
    let rest = line.trim_start().strip_prefix(MARKER)?;
    // `#typedef` and friends are not markers
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let keyword = rest.split_whitespace().next().unwrap_or("");
    Some(stage_for_keyword(keyword).ok_or_else(|| Error::UnknownStage(keyword.to_string())))
}

/// Split `source` into its vertex and pixel stage blocks
///
/// # Errors
///
/// * `Error::UnknownStage` - a marker names an unknown stage keyword
/// * `Error::MissingStage` - the document lacks a vertex or pixel block
pub fn preprocess(source: &str) -> Result<StageSources> {
    let mut blocks: FxHashMap<ShaderStage, StageSource> = FxHashMap::default();
    let mut current: Option<(ShaderStage, usize, Vec<&str>)> = None;

    let mut flush = |block: Option<(ShaderStage, usize, Vec<&str>)>| {
        if let Some((stage, first_line, lines)) = block {
            let replaced = blocks.insert(stage, StageSource {
                stage,
                text: lines.join("\n"),
                first_line,
            });
            if let Some(previous) = replaced {
                engine_warn!(
                    "wiz3d::ShaderPreprocessor",
                    "Duplicate {:?} block at line {} replaces the one at line {}",
                    stage, first_line - 1, previous.first_line - 1
                );
            }
        }
    };

    // `lines()` strips the '\r' of "\r\n" endings
    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        match parse_marker(line) {
            Some(stage) => {
                let stage = stage?;
                flush(current.take());
                current = Some((stage, line_number + 1, Vec::new()));
            }
            None => {
                if let Some((_, _, lines)) = current.as_mut() {
                    lines.push(line);
                }
            }
        }
    }
    flush(current.take());

    let vertex = blocks
        .remove(&ShaderStage::Vertex)
        .ok_or(Error::MissingStage(ShaderStage::Vertex))?;
    let pixel = blocks
        .remove(&ShaderStage::Pixel)
        .ok_or(Error::MissingStage(ShaderStage::Pixel))?;

    Ok(StageSources { vertex, pixel })
}

#[cfg(test)]
#[path = "preprocessor_tests.rs"]
mod tests;
