// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fallback USDA text parser
//!
//! Used when no native reader is available. The text is cut into statements
//! and brace events by [`Segmenter`]; [`LayerBuilder`] then tracks a stack of
//! open blocks. A prim declaration (`def|over|class [Type] "name"`) stays
//! pending until its `{` arrives, so metadata blocks between the declaration
//! and the body are tolerated. Nesting comes from brace balance, never from
//! indentation.
//!
//! Nothing here fails the whole document: statements that cannot be read are
//! dropped and parsing continues.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, opt},
    sequence::{terminated, tuple},
    IResult,
};

use crate::literal::parse_string;
use crate::metadata::{find_top_level, parse_metadata_block, LayerMetadata};
use crate::scene::{
    AuthoredAttribute, PrimMetadata, SceneNode, Specifier, VariantOption, VariantSetSpec,
};

/// A parsed layer: header metadata plus the root prims in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLayer {
    pub metadata: LayerMetadata,
    pub roots: Vec<SceneNode>,
}

/// Parse document text into an ordered forest of root prims.
pub fn parse_document(text: &str) -> Vec<SceneNode> {
    parse_layer(text).roots
}

/// Parse document text into header metadata and root prims.
pub fn parse_layer(text: &str) -> ParsedLayer {
    let mut builder = LayerBuilder::default();
    for segment in Segmenter::new(text) {
        builder.feed(segment);
    }
    builder.finish()
}

/// One lexical unit produced by the segmenter.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// A complete statement with surrounding whitespace trimmed
    Statement(String),
    /// A block-opening `{`
    Open,
    /// A block-closing `}`
    Close,
}

/// Quote-like runs inside which structure characters are plain text.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Quoted {
    Double,
    Single,
    Triple,
    Asset,
    Target,
}

/// Splits USDA text into statements and brace events.
///
/// A statement ends at a newline or `;` when no parenthesis or bracket is
/// open. A `{` directly after `=` starts a dictionary value (e.g.
/// `timeSamples`) and is kept inside the statement. Comments run from `#`
/// to the end of the line.
pub struct Segmenter<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    queue: std::collections::VecDeque<Segment>,
    buffer: String,
    nesting: u32,
    /// Braces opened inside an open parenthesis or bracket
    nested_braces: u32,
    dictionary: u32,
    quoted: Option<Quoted>,
    /// Buffer length just after an opening `"""`
    triple_start: usize,
    escaped: bool,
    done: bool,
}

impl<'a> Segmenter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            queue: std::collections::VecDeque::new(),
            buffer: String::new(),
            nesting: 0,
            nested_braces: 0,
            dictionary: 0,
            quoted: None,
            triple_start: 0,
            escaped: false,
            done: false,
        }
    }

    fn flush(&mut self) {
        let statement = self.buffer.trim();
        if !statement.is_empty() {
            self.queue.push_back(Segment::Statement(statement.to_string()));
        }
        self.buffer.clear();
    }

    /// Drop a statement whose parenthesis or bracket never closed.
    fn abandon(&mut self) {
        self.buffer.clear();
        self.nesting = 0;
        self.nested_braces = 0;
        self.dictionary = 0;
    }

    /// The next line starts a prim declaration.
    fn next_line_declares_prim(&self) -> bool {
        let rest: String = self.chars.clone().take_while(|&c| c != '\n').collect();
        let mut words = rest.split_whitespace();
        matches!(words.next(), Some("def" | "over" | "class")) && words.next().is_some()
    }

    fn in_value(&self) -> bool {
        self.nesting > 0 || self.dictionary > 0
    }

    /// Consume one character outside quoted runs.
    fn step(&mut self, c: char) {
        match c {
            '#' => {
                // Comment: skip to end of line, keep the newline
                while let Some(&next) = self.chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    self.chars.next();
                }
            }
            '"' => {
                let triple = {
                    let mut ahead = self.chars.clone();
                    ahead.next() == Some('"') && ahead.next() == Some('"')
                };
                if triple {
                    self.chars.next();
                    self.chars.next();
                    self.buffer.push_str("\"\"\"");
                    self.triple_start = self.buffer.len();
                    self.quoted = Some(Quoted::Triple);
                } else {
                    self.buffer.push(c);
                    self.quoted = Some(Quoted::Double);
                }
            }
            '\'' => {
                self.buffer.push(c);
                self.quoted = Some(Quoted::Single);
            }
            '@' => {
                self.buffer.push(c);
                self.quoted = Some(Quoted::Asset);
            }
            '<' => {
                self.buffer.push(c);
                self.quoted = Some(Quoted::Target);
            }
            '(' | '[' => {
                self.nesting += 1;
                self.buffer.push(c);
            }
            ')' | ']' => {
                self.nesting = self.nesting.saturating_sub(1);
                self.buffer.push(c);
            }
            '{' => {
                if self.nesting > 0 {
                    self.nested_braces += 1;
                    self.buffer.push(c);
                } else if self.dictionary > 0 || self.opens_dictionary() {
                    self.dictionary += 1;
                    self.buffer.push(c);
                } else {
                    self.flush();
                    self.queue.push_back(Segment::Open);
                }
            }
            '}' => {
                if self.nesting > 0 && self.nested_braces > 0 {
                    self.nested_braces -= 1;
                    self.buffer.push(c);
                } else if self.nesting > 0 {
                    // Closes the enclosing block, so the open value is malformed
                    self.abandon();
                    self.queue.push_back(Segment::Close);
                } else if self.dictionary > 0 {
                    self.dictionary -= 1;
                    self.buffer.push(c);
                } else {
                    self.flush();
                    self.queue.push_back(Segment::Close);
                }
            }
            '\n' if self.nesting > 0 && self.next_line_declares_prim() => self.abandon(),
            '\n' | ';' if !self.in_value() => self.flush(),
            _ => self.buffer.push(c),
        }
    }

    /// `name = {` starts a dictionary value; `variantSet "x" = {` is a block.
    fn opens_dictionary(&self) -> bool {
        let pending = self.buffer.trim();
        pending.ends_with('=') && !pending.starts_with("variantSet")
    }

    /// Consume one character inside a quoted run.
    fn step_quoted(&mut self, c: char, quoted: Quoted) {
        // Only triple-quoted strings may span lines
        if c == '\n' && quoted != Quoted::Triple {
            self.quoted = None;
            self.escaped = false;
            self.step(c);
            return;
        }
        self.buffer.push(c);
        if self.escaped {
            self.escaped = false;
            return;
        }
        let closed = match quoted {
            Quoted::Double | Quoted::Single => {
                if c == '\\' {
                    self.escaped = true;
                }
                (quoted == Quoted::Double && c == '"') || (quoted == Quoted::Single && c == '\'')
            }
            Quoted::Triple => {
                c == '"'
                    && self.buffer.len() >= self.triple_start + 3
                    && self.buffer.ends_with("\"\"\"")
            }
            Quoted::Asset => c == '@',
            Quoted::Target => c == '>',
        };
        if closed {
            self.quoted = None;
        }
    }
}

impl Iterator for Segmenter<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        loop {
            if let Some(segment) = self.queue.pop_front() {
                return Some(segment);
            }
            if self.done {
                return None;
            }
            match self.chars.next() {
                Some(c) => match self.quoted {
                    Some(quoted) => self.step_quoted(c, quoted),
                    None => self.step(c),
                },
                None => {
                    self.flush();
                    self.done = true;
                }
            }
        }
    }
}

/// A declaration waiting for its `{`.
#[derive(Debug)]
enum Pending {
    Prim(SceneNode),
    VariantSet(String),
    VariantOption(String),
}

/// An open block on the brace stack.
#[derive(Debug)]
enum Frame {
    Prim(SceneNode),
    VariantSet(VariantSetSpec),
    VariantOption(VariantOption),
    /// A brace pair the builder does not interpret
    Block,
}

/// Folds segments into a prim forest using a brace-depth stack.
#[derive(Debug, Default)]
pub struct LayerBuilder {
    metadata: LayerMetadata,
    header_seen: bool,
    roots: Vec<SceneNode>,
    stack: Vec<Frame>,
    pending: Option<Pending>,
}

impl LayerBuilder {
    pub fn feed(&mut self, segment: Segment) {
        match segment {
            Segment::Statement(statement) => self.statement(&statement),
            Segment::Open => self.open(),
            Segment::Close => self.close(),
        }
    }

    pub fn finish(mut self) -> ParsedLayer {
        self.settle_pending();
        while !self.stack.is_empty() {
            self.close();
        }
        ParsedLayer {
            metadata: self.metadata,
            roots: self.roots,
        }
    }

    /// Path of the innermost enclosing prim.
    fn enclosing_prim_path(&self) -> Option<&str> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Prim(node) => Some(node.path.as_str()),
            _ => None,
        })
    }

    fn statement(&mut self, statement: &str) {
        // A metadata block on its own line belongs to the pending declaration
        if statement.starts_with('(') {
            match &mut self.pending {
                Some(Pending::Prim(node)) => {
                    node.metadata =
                        PrimMetadata::from_entries(parse_metadata_block(strip_parens(statement)));
                    return;
                }
                Some(_) => return,
                None => {}
            }
            if !self.header_seen
                && self.stack.is_empty()
                && self.roots.is_empty()
                && self.pending.is_none()
            {
                self.header_seen = true;
                self.metadata =
                    LayerMetadata::from_entries(parse_metadata_block(strip_parens(statement)));
                return;
            }
        }

        self.settle_pending();

        if let Ok((_, (specifier, type_name, name, rest))) = prim_declaration(statement) {
            let mut node = SceneNode::new(
                self.enclosing_prim_path(),
                specifier,
                type_name.map(str::to_string),
                name,
            );
            let rest = rest.trim();
            if rest.starts_with('(') {
                node.metadata =
                    PrimMetadata::from_entries(parse_metadata_block(strip_parens(rest)));
            }
            self.pending = Some(Pending::Prim(node));
            return;
        }

        if let Ok((_, name)) = variant_set_declaration(statement) {
            if matches!(self.stack.last(), Some(Frame::Prim(_))) {
                self.pending = Some(Pending::VariantSet(name));
            }
            return;
        }

        if let Some(Frame::VariantSet(_)) = self.stack.last() {
            if let Some(name) = variant_option_declaration(statement) {
                self.pending = Some(Pending::VariantOption(name));
            }
            return;
        }

        if let Some(attribute) = parse_attribute(statement) {
            match self.stack.last_mut() {
                Some(Frame::Prim(node)) => node.attributes.push(attribute),
                Some(Frame::VariantOption(option)) => option.attributes.push(attribute),
                _ => {}
            }
        }
    }

    fn open(&mut self) {
        let frame = match self.pending.take() {
            Some(Pending::Prim(node)) => Frame::Prim(node),
            Some(Pending::VariantSet(name)) => Frame::VariantSet(VariantSetSpec {
                name,
                options: Vec::new(),
            }),
            Some(Pending::VariantOption(name)) => Frame::VariantOption(VariantOption::new(name)),
            None => Frame::Block,
        };
        self.stack.push(frame);
    }

    fn close(&mut self) {
        self.settle_pending();
        match self.stack.pop() {
            Some(Frame::Prim(node)) => self.attach(node),
            Some(Frame::VariantSet(set)) => {
                if let Some(Frame::Prim(owner)) = self.stack.last_mut() {
                    owner.variant_sets.push(set);
                }
            }
            Some(Frame::VariantOption(option)) => {
                if let Some(Frame::VariantSet(set)) = self.stack.last_mut() {
                    set.options.push(option);
                }
            }
            Some(Frame::Block) | None => {}
        }
    }

    /// A declaration that never received a body is kept as a leaf.
    fn settle_pending(&mut self) {
        match self.pending.take() {
            Some(Pending::Prim(node)) => self.attach(node),
            // A variant declaration without a body is dropped
            Some(_) | None => {}
        }
    }

    /// Attach a finished prim to the innermost prim or variant option.
    fn attach(&mut self, node: SceneNode) {
        for frame in self.stack.iter_mut().rev() {
            match frame {
                Frame::Prim(parent) => {
                    parent.children.push(node);
                    return;
                }
                Frame::VariantOption(option) => {
                    option.children.push(node);
                    return;
                }
                Frame::VariantSet(_) | Frame::Block => {}
            }
        }
        self.roots.push(node);
    }
}

/// Strip one pair of outer parentheses.
fn strip_parens(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed)
}

/// Identifier characters allowed in type names
fn is_type_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ':' || c == '.'
}

/// Quoted name: "name"
fn quoted_name(input: &str) -> IResult<&str, String> {
    let end = input
        .strip_prefix('"')
        .and_then(|body| body.find('"'))
        .ok_or_else(|| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char))
        })?;
    let literal = &input[..end + 2];
    match parse_string(literal) {
        Some(name) => Ok((&input[end + 2..], name)),
        None => Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char))),
    }
}

/// Parse specifier: def | over | class
fn specifier(input: &str) -> IResult<&str, Specifier> {
    map(
        terminated(alt((tag("def"), tag("over"), tag("class"))), multispace1),
        |keyword: &str| Specifier::from_keyword(keyword).unwrap_or(Specifier::Def),
    )(input)
}

/// Parse a prim declaration: `def Xform "Root" (metadata)`
///
/// Returns the specifier, optional type name, prim name and the remainder.
fn prim_declaration(input: &str) -> IResult<&str, (Specifier, Option<&str>, String, &str)> {
    let (rest, (spec, type_name, name)) = tuple((
        specifier,
        opt(terminated(take_while1(is_type_char), multispace1)),
        quoted_name,
    ))(input)?;
    Ok(("", (spec, type_name, name, rest)))
}

/// Parse `variantSet "name" =`
fn variant_set_declaration(input: &str) -> IResult<&str, String> {
    let (rest, (_, _, name, _, _)) = tuple((
        tag("variantSet"),
        multispace1,
        quoted_name,
        multispace0,
        char('='),
    ))(input)?;
    Ok((rest, name))
}

/// A variant option opens with its quoted name, optionally followed by metadata.
fn variant_option_declaration(statement: &str) -> Option<String> {
    let (rest, name) = quoted_name(statement).ok()?;
    let rest = rest.trim();
    (rest.is_empty() || rest.starts_with('(')).then_some(name)
}

/// Parse an attribute or relationship statement:
/// `[custom] [uniform] type name [= value] [( metadata )]`.
pub fn parse_attribute(statement: &str) -> Option<AuthoredAttribute> {
    let (lhs, rhs) = match find_top_level(statement, '=') {
        Some(eq) => (statement[..eq].trim(), Some(statement[eq + 1..].trim())),
        None => (statement.trim(), None),
    };

    let tokens: Vec<&str> = lhs.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    let (name, type_tokens) = tokens.split_last()?;
    let valid_name = name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '.' | '[' | ']'));
    let valid_type = type_tokens
        .iter()
        .all(|t| t.chars().all(|c| is_type_char(c) || c == '[' || c == ']'));
    if !valid_name || !valid_type {
        return None;
    }

    let mut attribute = AuthoredAttribute::new(type_tokens.join(" "), *name, "");
    if let Some(rhs) = rhs {
        let (value, metadata) = split_trailing_metadata(rhs);
        attribute.literal = value.to_string();
        attribute.metadata = metadata.map(str::to_string);
    }
    Some(attribute)
}

/// Separate a value from a trailing `( ... )` metadata block.
fn split_trailing_metadata(rhs: &str) -> (&str, Option<&str>) {
    let Some(end) = value_end(rhs) else {
        return (rhs, None);
    };
    let tail = rhs[end..].trim();
    if tail.starts_with('(') && tail.ends_with(')') {
        (rhs[..end].trim(), Some(strip_parens(tail).trim()))
    } else {
        (rhs, None)
    }
}

/// Byte offset just past the first complete value item in `rhs`.
fn value_end(rhs: &str) -> Option<usize> {
    let mut chars = rhs.char_indices().peekable();
    let (_, first) = *chars.peek()?;

    let closing = |open: char| match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    };

    if let Some(close) = closing(first) {
        let mut depth = 0i32;
        let mut quote: Option<char> = None;
        for (i, c) in chars {
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '"' | '@' => quote = Some(c),
                '<' => quote = Some('>'),
                c if c == first => depth += 1,
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + c.len_utf8());
                    }
                }
                _ => {}
            }
        }
        return None;
    }

    match first {
        '"' | '\'' => {
            let mut escaped = false;
            for (i, c) in rhs.char_indices().skip(1) {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == first {
                    return Some(i + 1);
                }
            }
            None
        }
        '@' => {
            let close = rhs[1..].find('@')? + 2;
            // An asset may be followed directly by a prim target
            if rhs[close..].starts_with('<') {
                Some(close + rhs[close..].find('>')? + 1)
            } else {
                Some(close)
            }
        }
        '<' => Some(rhs.find('>')? + 1),
        _ => Some(rhs.find(char::is_whitespace).unwrap_or(rhs.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::find_node;

    fn segments(text: &str) -> Vec<Segment> {
        Segmenter::new(text).collect()
    }

    #[test]
    fn test_segmenter_splits_braces_on_one_line() {
        let segs = segments(r#"def Xform "Root" { def Sphere "Ball" {} }"#);
        assert_eq!(
            segs,
            vec![
                Segment::Statement(r#"def Xform "Root""#.to_string()),
                Segment::Open,
                Segment::Statement(r#"def Sphere "Ball""#.to_string()),
                Segment::Open,
                Segment::Close,
                Segment::Close,
            ]
        );
    }

    #[test]
    fn test_segmenter_keeps_dictionaries_and_comments() {
        let text = "# comment { not a block\nfloat a.timeSamples = {\n  0: 1,\n  10: 2,\n}\n\
                    string s = \"}{\" # trailing\n";
        let segs = segments(text);
        assert_eq!(segs.len(), 2);
        match &segs[0] {
            Segment::Statement(s) => {
                assert!(s.starts_with("float a.timeSamples = {") && s.ends_with('}'))
            }
            other => panic!("Expected statement, got {:?}", other),
        }
        assert_eq!(segs[1], Segment::Statement("string s = \"}{\"".to_string()));
    }

    #[test]
    fn test_two_line_document() {
        let roots = parse_document("def Xform \"Root\" {\n def Sphere \"Ball\" {} }");
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "Root");
        assert_eq!(roots[0].type_name.as_deref(), Some("Xform"));
        assert_eq!(roots[0].children.len(), 1);
        assert_eq!(roots[0].children[0].name, "Ball");
        assert_eq!(roots[0].children[0].path, "/Root/Ball");
    }

    #[test]
    fn test_full_layer() {
        let text = r#"#usda 1.0
(
    defaultPrim = "Root"
    metersPerUnit = 1
    upAxis = "Y"
)

def Xform "Root" (
    kind = "component"
    prepend references = @./base.usda@</Base>
    variants = {
        string color = "red"
    }
    prepend variantSets = "color"
)
{
    float3 xformOp:translate = (0, 1.5, 0)
    uniform token[] xformOpOrder = ["xformOp:translate"]
    rel material:binding = </Root/Materials/Red> (
        bindMaterialAs = "strongerThanDescendants"
    )

    def RealityKitComponent "Collider"
    {
        uniform token info:id = "RealityKit.Collider"
        uint group = 1

        def RealityKitStruct "Shape"
        {
            token shapeType = "Box"
            float3 extent = (0.2, 0.2, 0.2)
        }
    }

    variantSet "color" = {
        "red" {
            def Mesh "RedBody" {}
        }
        "blue" (
            doc = "blue body"
        ) {
            def Mesh "BlueBody"
            {
            }
        }
    }

    over "Overridden" {}
    class "Template" {}
}
"#;
        let layer = parse_layer(text);
        assert_eq!(layer.metadata.default_prim.as_deref(), Some("Root"));
        assert_eq!(layer.roots.len(), 1);

        let root = &layer.roots[0];
        assert_eq!(root.metadata.kind.as_deref(), Some("component"));
        assert_eq!(root.metadata.references.len(), 1);
        assert_eq!(root.metadata.variant_selection("color"), Some("red"));
        assert_eq!(root.attribute("xformOp:translate").unwrap().literal, "(0, 1.5, 0)");
        assert_eq!(root.attribute("xformOpOrder").unwrap().type_name, "uniform token[]");

        let binding = root.attribute("material:binding").unwrap();
        assert!(binding.is_relationship());
        assert_eq!(binding.literal, "</Root/Materials/Red>");
        assert_eq!(
            binding.metadata.as_deref(),
            Some("bindMaterialAs = \"strongerThanDescendants\"")
        );

        let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Collider", "Overridden", "Template"]);
        assert_eq!(root.children[1].specifier, Specifier::Over);
        assert_eq!(root.children[1].type_name, None);
        assert_eq!(root.children[2].specifier, Specifier::Class);

        let shape = find_node(&layer.roots, "/Root/Collider/Shape").unwrap();
        assert_eq!(shape.attribute("shapeType").unwrap().literal, "\"Box\"");

        let set = root.variant_set("color").unwrap();
        assert_eq!(set.options.len(), 2);
        assert_eq!(set.options[0].children[0].path, "/Root/RedBody");
        assert_eq!(set.options[1].children[0].name, "BlueBody");
    }

    #[test]
    fn test_pending_declaration_without_body() {
        let text = "def Xform \"Root\" {\n    def Sphere \"Leaf\"\n    def Cube \"Boxed\" {}\n}\n";
        let roots = parse_document(text);
        let names: Vec<&str> = roots[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Leaf", "Boxed"]);
    }

    #[test]
    fn test_degrades_on_malformed_input() {
        let text = "def Xform \"Root\" {\n  this is not valid ###\n  def \"Unterminated\n\
                    def Mesh \"Good\" {}\n}}}\ndef Xform \"Second\" {";
        let roots = parse_document(text);
        assert_eq!(roots.len(), 2);
        assert!(roots[0].children.iter().any(|c| c.name == "Good"));
        assert_eq!(roots[1].name, "Second");
    }

    #[test]
    fn test_unclosed_bracket_keeps_later_prims() {
        let text = "def Xform \"Root\" {\n  float a = (1, 2\n  def Mesh \"Good\" {\n  }\n}\n\
                    def Xform \"Other\" {\n  int[] b = [1, 2\n}\ndef Scope \"Last\" {\n}\n";
        let roots = parse_document(text);
        let names: Vec<&str> = roots.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Root", "Other", "Last"]);
        assert!(roots[0].children.iter().any(|c| c.name == "Good"));
        assert!(roots[0].attributes.iter().all(|a| a.name != "a"));
        assert!(roots[1].attributes.is_empty());
    }

    #[test]
    fn test_metadata_dictionary_inside_parentheses() {
        let text = "def Xform \"Root\" (\n    customData = {\n        int x = 1\n    }\n) {\n\
                    def Mesh \"Child\" {}\n}\n";
        let roots = parse_document(text);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].children[0].name, "Child");
    }

    #[test]
    fn test_reparse_is_stable() {
        let text = "def Xform \"A\" {\n def Scope \"B\" { def Mesh \"C\" {} }\n}\n";
        assert_eq!(parse_document(text), parse_document(text));
    }

    #[test]
    fn test_parse_attribute() {
        let attr = parse_attribute("custom uniform double gain = -3.5").unwrap();
        assert_eq!(attr.type_name, "custom uniform double");
        assert_eq!(attr.name, "gain");
        assert_eq!(attr.literal, "-3.5");

        let decl = parse_attribute("float radius").unwrap();
        assert!(!decl.has_value());

        let asset = parse_attribute("uniform asset file = @./a b.wav@ (hidden = true)").unwrap();
        assert_eq!(asset.literal, "@./a b.wav@");
        assert_eq!(asset.metadata.as_deref(), Some("hidden = true"));

        assert!(parse_attribute("garbage").is_none());
        assert!(parse_attribute("\"quoted\" thing = 1").is_none());
    }
}
