/// Shader reflection - derives the interface of a program from its text
///
/// Three things are extracted, all from declarations at global scope:
///
/// - the vertex attribute layout, from the struct taken by the vertex
///   stage's `main` as its first parameter
/// - the uniform blocks of each stage (`cbuffer Name : register(bN) { ... }`)
/// - the texture resources of the pixel stage (`Texture2D name : register(tN);`)
///
/// `reflect` additionally validates the declarations and gives every
/// unannotated block and resource a slot.

use rustc_hash::FxHashSet;
use crate::device::{ShaderStage, VertexAttribute};
use crate::error::{Error, Result, SlotKind};
use crate::shader::lexer::{Lexer, Token, TokenKind};
use crate::shader::preprocessor::StageSources;
use crate::shader::types::ShaderType;
use crate::utils::SlotAllocator;

/// Uniform buffer slots available per stage
pub const UNIFORM_SLOT_COUNT: u32 = 14;

/// Texture resource slots available per stage
pub const RESOURCE_SLOT_COUNT: u32 = 128;

/// Entry point of every stage
pub const ENTRY_POINT: &str = "main";

const TEXTURE_KEYWORDS: [&str; 5] = ["Texture1D", "Texture2D", "Texture2DArray", "Texture3D", "TextureCube"];
const PARAMETER_QUALIFIERS: [&str; 3] = ["in", "const", "uniform"];
const MEMBER_MODIFIERS: [&str; 7] = ["row_major", "column_major", "const", "uniform", "static", "precise", "volatile"];

// ===== REFLECTED TYPES =====

/// Slot of a uniform block or resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotBinding {
    /// No `register(...)` annotation; resolved by `reflect`
    Unassigned,
    Register(u32),
}

impl SlotBinding {
    pub fn index(&self) -> Option<u32> {
        match self {
            SlotBinding::Unassigned => None,
            SlotBinding::Register(n) => Some(*n),
        }
    }
}

/// One `cbuffer` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    /// Block name, empty for an anonymous block
    pub name: String,
    pub slot: SlotBinding,
    /// Sum of member sizes in bytes (no packing)
    pub size: u32,
    pub stage: ShaderStage,
}

/// One texture declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBinding {
    pub name: String,
    pub slot: SlotBinding,
    pub stage: ShaderStage,
}

/// Everything reflected from a document, with all slots resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderReflection {
    pub attributes: Vec<VertexAttribute>,
    /// Vertex-stage blocks first, then pixel-stage blocks, each in declaration order
    pub uniform_blocks: Vec<UniformBlock>,
    pub resources: Vec<ResourceBinding>,
}

impl ShaderReflection {
    /// Uniform blocks of one stage, in declaration order
    pub fn blocks_for(&self, stage: ShaderStage) -> impl Iterator<Item = &UniformBlock> {
        self.uniform_blocks.iter().filter(move |b| b.stage == stage)
    }

    /// Bytes per vertex of the reflected layout
    pub fn vertex_stride(&self) -> u32 {
        self.attributes.iter().map(|a| a.format.size_bytes()).sum()
    }
}

// ===== TOKEN STREAM =====

/// Tokens of one stage with their global-scope flags
struct Tokens {
    tokens: Vec<Token>,
    /// `global[i]` is true when token `i` sits outside any braces or parentheses
    global: Vec<bool>,
    first_line: usize,
    last_line: usize,
}

impl Tokens {
    fn new(text: &str, first_line: usize) -> Self {
        let tokens = Lexer::starting_at_line(text, first_line).tokenize();

        let mut global = Vec::with_capacity(tokens.len());
        let (mut braces, mut parens) = (0usize, 0usize);
        for token in &tokens {
            global.push(braces == 0 && parens == 0);
            match token.kind {
                TokenKind::Punct('{') => braces += 1,
                TokenKind::Punct('}') => braces = braces.saturating_sub(1),
                TokenKind::Punct('(') => parens += 1,
                TokenKind::Punct(')') => parens = parens.saturating_sub(1),
                _ => {}
            }
        }

        let last_line = first_line + text.lines().count().saturating_sub(1);
        Self { tokens, global, first_line, last_line }
    }

    fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    fn ident_at(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Token::ident)
    }

    fn is_punct_at(&self, index: usize, c: char) -> bool {
        self.get(index).is_some_and(|t| t.is_punct(c))
    }

    /// Line of token `index`, or the last line when past the end
    fn line_at(&self, index: usize) -> usize {
        self.get(index).map_or(self.last_line, |t| t.line)
    }

    /// Indices of global-scope identifiers equal to `word`
    fn globals<'a>(&'a self, word: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.tokens
            .iter()
            .enumerate()
            .filter(move |(i, t)| self.global[*i] && t.is_ident(word))
            .map(|(i, _)| i)
    }

    /// Index of the bracket closing the one opened at `open_index`
    fn closing(&self, open_index: usize, open: char, close: char) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(open_index) {
            if token.is_punct(open) {
                depth += 1;
            } else if token.is_punct(close) {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }

    /// Source text from `from` up to the end of the declaration, for messages
    fn annotation_text(&self, from: usize) -> String {
        self.tokens[from.min(self.tokens.len())..]
            .iter()
            .take_while(|t| !t.is_punct(';') && !t.is_punct('{'))
            .map(Token::text)
            .collect()
    }

    /// Split `start..end` into `;`-terminated declarations at bracket depth 0
    fn declarations(&self, start: usize, end: usize) -> Vec<&[Token]> {
        let body = &self.tokens[start..end];
        let mut decls = Vec::new();
        let mut depth = 0usize;
        let mut begin = 0;
        for (i, token) in body.iter().enumerate() {
            match token.kind {
                TokenKind::Punct('{') => depth += 1,
                TokenKind::Punct('}') => depth = depth.saturating_sub(1),
                TokenKind::Punct(';') if depth == 0 => {
                    if i > begin {
                        decls.push(&body[begin..i]);
                    }
                    begin = i + 1;
                }
                _ => {}
            }
        }
        if begin < body.len() {
            decls.push(&body[begin..]);
        }
        decls
    }
}

// ===== SLOT ANNOTATIONS =====

/// Parse `register(<prefix><n>)` beginning at token `at`
///
/// Returns the slot and the index just past the closing parenthesis.
fn parse_register(
    ts: &Tokens,
    at: usize,
    kind: SlotKind,
    capacity: u32,
    decl_name: &str,
) -> Result<(SlotBinding, usize)> {
    let malformed = || Error::MalformedSlotAnnotation {
        name: decl_name.to_string(),
        annotation: ts.annotation_text(at),
        line: ts.line_at(at),
    };

    if ts.ident_at(at) != Some("register") || !ts.is_punct_at(at + 1, '(') {
        return Err(malformed());
    }
    let close = ts.closing(at + 1, '(', ')').ok_or_else(malformed)?;
    let register = ts.ident_at(at + 2).filter(|_| at + 2 < close).ok_or_else(malformed)?;

    let mut chars = register.chars();
    let prefix = chars.next().map(|c| c.to_ascii_lowercase());
    let digits = chars.as_str();
    if prefix != Some(kind.prefix()) || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let slot: u32 = digits.parse().map_err(|_| malformed())?;
    if slot >= capacity {
        return Err(malformed());
    }

    Ok((SlotBinding::Register(slot), close + 1))
}

// ===== VERTEX LAYOUT =====

/// Split a semantic like `TEXCOORD1` into its name and index
fn split_semantic(semantic: &str, line: usize) -> Result<(String, u32)> {
    let name = semantic.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &semantic[name.len()..];
    let index = if digits.is_empty() {
        0
    } else {
        digits.parse().map_err(|_| Error::ShaderSyntax {
            line,
            message: format!("semantic index of '{}' is out of range", semantic),
        })?
    };
    Ok((name.to_string(), index))
}

fn vertex_layout_in(ts: &Tokens) -> Result<Vec<VertexAttribute>> {
    let main = ts
        .globals(ENTRY_POINT)
        .find(|&i| ts.is_punct_at(i + 1, '('))
        .ok_or_else(|| Error::ShaderSyntax {
            line: ts.first_line,
            message: format!("entry point '{}' not found", ENTRY_POINT),
        })?;

    let mut pos = main + 2;
    while ts.ident_at(pos).is_some_and(|w| PARAMETER_QUALIFIERS.contains(&w)) {
        pos += 1;
    }
    let input_type = ts.ident_at(pos).ok_or_else(|| Error::ShaderSyntax {
        line: ts.line_at(main),
        message: format!("'{}' takes no vertex input parameter", ENTRY_POINT),
    })?;

    let body_open = ts
        .globals("struct")
        .find(|&i| ts.ident_at(i + 1) == Some(input_type) && ts.is_punct_at(i + 2, '{'))
        .map(|i| i + 2)
        .ok_or_else(|| Error::ShaderSyntax {
            line: ts.line_at(pos),
            message: format!("input struct '{}' not found", input_type),
        })?;
    let body_close = ts.closing(body_open, '{', '}').ok_or_else(|| Error::ShaderSyntax {
        line: ts.line_at(body_open),
        message: format!("struct '{}' is not closed", input_type),
    })?;

    let mut attributes = Vec::new();
    let mut offset = 0u32;
    for decl in ts.declarations(body_open + 1, body_close) {
        let line = decl[0].line;
        let colon = decl.iter().position(|t| t.is_punct(':'));
        let names: Vec<&str> = decl[..colon.unwrap_or(decl.len())]
            .iter()
            .filter_map(Token::ident)
            .collect();
        let (type_name, member) = match names.as_slice() {
            [.., type_name, member] => (*type_name, *member),
            _ => {
                return Err(Error::ShaderSyntax {
                    line,
                    message: format!("malformed member in struct '{}'", input_type),
                })
            }
        };

        let semantic = colon
            .and_then(|c| decl.get(c + 1))
            .and_then(Token::ident)
            .ok_or_else(|| Error::ShaderSyntax {
                line,
                message: format!("member '{}' of '{}' has no semantic", member, input_type),
            })?;

        let format = ShaderType::from_name(type_name)
            .and_then(|t| t.attribute_format())
            .ok_or_else(|| Error::UnknownType { type_name: type_name.to_string(), line })?;

        let (semantic, semantic_index) = split_semantic(semantic, line)?;
        attributes.push(VertexAttribute { semantic, semantic_index, format, offset });
        offset += format.size_bytes();
    }

    Ok(attributes)
}

/// Derive the vertex attribute layout from vertex stage text
///
/// # Errors
///
/// * `Error::ShaderSyntax` - no `main`, no input struct, or a member without a semantic
/// * `Error::UnknownType` - a member type is not a float vector
pub fn reflect_vertex_layout(vertex_text: &str) -> Result<Vec<VertexAttribute>> {
    vertex_layout_in(&Tokens::new(vertex_text, 1))
}

// ===== UNIFORM BLOCKS =====

/// Number of elements a declarator covers (`a` = 1, `a[4]` = 4, `a[2][3]` = 6)
fn too_large(line: usize) -> Error {
    Error::ShaderSyntax {
        line,
        message: "uniform block too large".to_string(),
    }
}

fn element_count(declarator: &[Token], line: usize) -> Result<u32> {
    let mut count = 1u32;
    for (i, token) in declarator.iter().enumerate() {
        if token.is_punct(':') {
            break;
        }
        if token.is_punct('[') {
            let dimension = declarator
                .get(i + 1)
                .and_then(|t| match &t.kind {
                    TokenKind::Number(n) => n.parse::<u32>().ok(),
                    _ => None,
                })
                .ok_or_else(|| Error::ShaderSyntax {
                    line,
                    message: "array size must be an integer literal".to_string(),
                })?;
            count = count.checked_mul(dimension).ok_or_else(|| too_large(line))?;
        }
    }
    Ok(count)
}

/// Byte size of one member declaration such as `float4 a, b[2];`
fn member_size(decl: &[Token]) -> Result<u32> {
    let line = decl[0].line;
    let start = decl
        .iter()
        .position(|t| !t.ident().is_some_and(|w| MEMBER_MODIFIERS.contains(&w)))
        .unwrap_or(decl.len());

    let type_token = decl.get(start).ok_or_else(|| Error::ShaderSyntax {
        line,
        message: "member declaration without a type".to_string(),
    })?;
    let ty = ShaderType::from_name(type_token.ident().unwrap_or_default()).ok_or_else(|| {
        Error::UnknownType { type_name: type_token.text(), line: type_token.line }
    })?;

    let mut size = 0u32;
    let mut depth = 0usize;
    let mut begin = start + 1;
    let rest = decl.len();
    for i in start + 1..=rest {
        let at_end = i == rest;
        if !at_end {
            match decl[i].kind {
                TokenKind::Punct('(') | TokenKind::Punct('[') => depth += 1,
                TokenKind::Punct(')') | TokenKind::Punct(']') => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        if at_end || (depth == 0 && decl[i].is_punct(',')) {
            let declarator = &decl[begin..i];
            if !declarator.first().is_some_and(|t| t.ident().is_some()) {
                return Err(Error::ShaderSyntax {
                    line,
                    message: format!("'{}' member without a name", ty.name()),
                });
            }
            size = ty
                .size_bytes()
                .checked_mul(element_count(declarator, line)?)
                .and_then(|bytes| size.checked_add(bytes))
                .ok_or_else(|| too_large(line))?;
            begin = i + 1;
        }
    }
    Ok(size)
}

fn uniform_blocks_in(stage: ShaderStage, ts: &Tokens) -> Result<Vec<UniformBlock>> {
    let mut blocks = Vec::new();

    for at in ts.globals("cbuffer") {
        let mut pos = at + 1;
        let name = match ts.ident_at(pos) {
            Some(name) => {
                pos += 1;
                name.to_string()
            }
            None => String::new(),
        };

        let mut slot = SlotBinding::Unassigned;
        if ts.is_punct_at(pos, ':') {
            let (parsed, next) =
                parse_register(ts, pos + 1, SlotKind::UniformBlock, UNIFORM_SLOT_COUNT, &name)?;
            slot = parsed;
            pos = next;
        }

        if !ts.is_punct_at(pos, '{') {
            return Err(Error::ShaderSyntax {
                line: ts.line_at(pos),
                message: format!("expected '{{' after cbuffer '{}'", name),
            });
        }
        let close = ts.closing(pos, '{', '}').ok_or_else(|| Error::ShaderSyntax {
            line: ts.line_at(pos),
            message: format!("cbuffer '{}' is not closed", name),
        })?;

        let mut size = 0u32;
        for decl in ts.declarations(pos + 1, close) {
            size = size
                .checked_add(member_size(decl)?)
                .ok_or_else(|| too_large(decl[0].line))?;
        }

        blocks.push(UniformBlock { name, slot, size, stage });
    }

    Ok(blocks)
}

/// Extract the uniform blocks declared in one stage's text
///
/// Slots are left as written: unannotated blocks stay `Unassigned`.
pub fn reflect_uniform_blocks(stage: ShaderStage, text: &str) -> Result<Vec<UniformBlock>> {
    uniform_blocks_in(stage, &Tokens::new(text, 1))
}

// ===== RESOURCES =====

fn resources_in(stage: ShaderStage, ts: &Tokens) -> Result<Vec<ResourceBinding>> {
    let mut resources = Vec::new();

    let mut declarations: Vec<usize> = TEXTURE_KEYWORDS.iter().flat_map(|&kw| ts.globals(kw)).collect();
    declarations.sort_unstable();

    for at in declarations {
        let mut pos = at + 1;
        if ts.is_punct_at(pos, '<') {
            pos = (pos..ts.tokens.len())
                .find(|&i| ts.is_punct_at(i, '>'))
                .map(|i| i + 1)
                .ok_or_else(|| Error::ShaderSyntax {
                    line: ts.line_at(at),
                    message: "unterminated texture template argument".to_string(),
                })?;
        }

        let name = ts.ident_at(pos).ok_or_else(|| Error::ShaderSyntax {
            line: ts.line_at(at),
            message: "texture declaration without a name".to_string(),
        })?;
        pos += 1;

        if ts.is_punct_at(pos, '[') {
            pos = ts.closing(pos, '[', ']').map_or(pos, |i| i + 1);
        }

        let mut slot = SlotBinding::Unassigned;
        if ts.is_punct_at(pos, ':') {
            slot = parse_register(ts, pos + 1, SlotKind::Resource, RESOURCE_SLOT_COUNT, name)?.0;
        }

        resources.push(ResourceBinding { name: name.to_string(), slot, stage });
    }

    Ok(resources)
}

/// Extract the texture resources declared in pixel stage text
///
/// A `register(...)` annotation that is not `tN` fails the whole call.
pub fn reflect_resources(pixel_text: &str) -> Result<Vec<ResourceBinding>> {
    resources_in(ShaderStage::Pixel, &Tokens::new(pixel_text, 1))
}

// ===== VALIDATION & SLOT RESOLUTION =====

fn check_block_names(stage: ShaderStage, blocks: &[UniformBlock]) -> Result<()> {
    let mut seen = FxHashSet::default();
    for block in blocks.iter().filter(|b| !b.name.is_empty()) {
        if !seen.insert(block.name.as_str()) {
            return Err(Error::DuplicateBlock { stage, name: block.name.clone() });
        }
    }
    Ok(())
}

/// Reserve explicit slots, then give each unassigned slot the lowest free
/// index in declaration order
fn resolve_slots<'a>(
    stage: ShaderStage,
    kind: SlotKind,
    capacity: u32,
    slots: impl Iterator<Item = &'a mut SlotBinding>,
) -> Result<()> {
    let mut slots: Vec<&mut SlotBinding> = slots.collect();
    let mut allocator = SlotAllocator::new(capacity);

    for slot in slots.iter() {
        if let SlotBinding::Register(n) = **slot {
            if !allocator.reserve(n) {
                return Err(Error::DuplicateSlot { stage, kind, slot: n });
            }
        }
    }

    for slot in slots.iter_mut() {
        if **slot == SlotBinding::Unassigned {
            let n = allocator
                .alloc_lowest()
                .ok_or(Error::SlotsExhausted { stage, kind })?;
            **slot = SlotBinding::Register(n);
        }
    }

    Ok(())
}

/// Reflect a whole document
///
/// Errors carry document line numbers. On success every block and
/// resource has a `SlotBinding::Register` slot, unique per stage and kind.
pub fn reflect(sources: &StageSources) -> Result<ShaderReflection> {
    let vertex = Tokens::new(&sources.vertex.text, sources.vertex.first_line);
    let pixel = Tokens::new(&sources.pixel.text, sources.pixel.first_line);

    let attributes = vertex_layout_in(&vertex)?;
    let mut vertex_blocks = uniform_blocks_in(ShaderStage::Vertex, &vertex)?;
    let mut pixel_blocks = uniform_blocks_in(ShaderStage::Pixel, &pixel)?;
    let mut resources = resources_in(ShaderStage::Pixel, &pixel)?;

    check_block_names(ShaderStage::Vertex, &vertex_blocks)?;
    check_block_names(ShaderStage::Pixel, &pixel_blocks)?;

    resolve_slots(
        ShaderStage::Vertex,
        SlotKind::UniformBlock,
        UNIFORM_SLOT_COUNT,
        vertex_blocks.iter_mut().map(|b| &mut b.slot),
    )?;
    resolve_slots(
        ShaderStage::Pixel,
        SlotKind::UniformBlock,
        UNIFORM_SLOT_COUNT,
        pixel_blocks.iter_mut().map(|b| &mut b.slot),
    )?;
    resolve_slots(
        ShaderStage::Pixel,
        SlotKind::Resource,
        RESOURCE_SLOT_COUNT,
        resources.iter_mut().map(|r| &mut r.slot),
    )?;

    vertex_blocks.append(&mut pixel_blocks);
    Ok(ShaderReflection {
        attributes,
        uniform_blocks: vertex_blocks,
        resources,
    })
}

#[cfg(test)]
#[path = "reflection_tests.rs"]
mod tests;
