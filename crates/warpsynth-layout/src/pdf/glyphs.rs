// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph extraction — interprets a page content stream with `lopdf` and emits
// one positioned box per shown glyph, descending into Form XObjects.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument, warn};
use warpsynth_core::error::{Result, WarpsynthError};

/// Nesting limit for Form XObjects (guards against reference cycles).
const MAX_FORM_DEPTH: usize = 16;

/// Advance used for codes without a width entry, in glyph-space units.
const FALLBACK_WIDTH: f64 = 500.0;

/// Largest character code taken from `/W` ranges and CMap ranges.
const MAX_CODE: u32 = 0xFFFF;

/// A shown glyph with its box in PDF user space (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Glyph {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// True for non-empty text made only of whitespace.
    pub fn is_whitespace(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_whitespace)
    }
}

/// Glyphs of one page in content order, with the page size.
#[derive(Debug, Clone)]
pub struct PageGlyphs {
    pub width: f64,
    pub height: f64,
    pub glyphs: Vec<Glyph>,
}

/// Extract the glyphs of the first page of `doc`.
#[instrument(skip_all)]
pub fn first_page_glyphs(doc: &Document) -> Result<PageGlyphs> {
    let pages = doc.get_pages();
    let (_, &page_id) = pages
        .iter()
        .next()
        .ok_or_else(|| WarpsynthError::Pdf("document has no pages".to_string()))?;

    let (width, height) = page_size(doc, page_id)?;

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|err| WarpsynthError::Pdf(format!("cannot read page content: {err}")))?;
    let content = Content::decode(&content_data)
        .map_err(|err| WarpsynthError::Pdf(format!("cannot decode page content: {err}")))?;

    let resources = inherited(doc, page_id, b"Resources").and_then(|obj| as_dict(doc, obj));

    let mut interpreter = Interpreter::new(doc);
    interpreter.run(&content, resources, 0);
    debug!(glyphs = interpreter.glyphs.len(), width, height, "Page glyphs extracted");

    Ok(PageGlyphs {
        width,
        height,
        glyphs: interpreter.glyphs,
    })
}

// -- Object helpers -----------------------------------------------------------

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn as_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj) {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn dict_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    dict.get(key).ok().and_then(|obj| number(resolve(doc, obj)))
}

fn dict_array<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Vec<Object>> {
    match resolve(doc, dict.get(key).ok()?) {
        Object::Array(items) => Some(items),
        _ => None,
    }
}

/// Look up a page attribute, following `/Parent` links for inherited keys.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok();
    for _ in 0..64 {
        let dict = node?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        node = dict.get(b"Parent").ok().and_then(|parent| as_dict(doc, parent));
    }
    None
}

/// Page size as the upper-right corner of the media box.
fn page_size(doc: &Document, page_id: ObjectId) -> Result<(f64, f64)> {
    let media_box = inherited(doc, page_id, b"MediaBox")
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| match obj {
            Object::Array(items) if items.len() == 4 => {
                let values: Vec<f64> = items.iter().filter_map(|v| number(resolve(doc, v))).collect();
                (values.len() == 4).then(|| (values[2], values[3]))
            }
            _ => None,
        })
        .ok_or_else(|| WarpsynthError::Pdf("page has no usable /MediaBox".to_string()))?;

    if media_box.0 <= 0.0 || media_box.1 <= 0.0 {
        return Err(WarpsynthError::Pdf(format!(
            "degenerate page size {} x {}",
            media_box.0, media_box.1
        )));
    }
    Ok(media_box)
}

fn decoded_stream(stream: &lopdf::Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

// -- Matrices -----------------------------------------------------------------

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m1` applied first, then `m2`.
fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    let [a1, b1, c1, d1, e1, f1] = *m1;
    let [a2, b2, c2, d2, e2, f2] = *m2;
    [
        a1 * a2 + b1 * c2,
        a1 * b2 + b1 * d2,
        c1 * a2 + d1 * c2,
        c1 * b2 + d1 * d2,
        e1 * a2 + f1 * c2 + e2,
        e1 * b2 + f1 * d2 + f2,
    ]
}

fn translate(m: &Matrix, tx: f64, ty: f64) -> Matrix {
    let [a, b, c, d, e, f] = *m;
    [a, b, c, d, tx * a + ty * c + e, tx * b + ty * d + f]
}

fn apply(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
    let [a, b, c, d, e, f] = *m;
    (a * x + c * y + e, b * x + d * y + f)
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (slot, operand) in m.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(m)
}

// -- Fonts --------------------------------------------------------------------

/// Metrics and character mapping of one font resource.
#[derive(Debug, Clone)]
struct FontMetrics {
    two_byte: bool,
    widths: HashMap<u32, f64>,
    default_width: f64,
    /// Descent in glyph-space units (usually negative).
    descent: f64,
    to_unicode: HashMap<u32, String>,
}

impl FontMetrics {
    fn fallback() -> Self {
        Self {
            two_byte: false,
            widths: HashMap::new(),
            default_width: FALLBACK_WIDTH,
            descent: 0.0,
            to_unicode: HashMap::new(),
        }
    }

    fn load(doc: &Document, font: &Dictionary) -> Self {
        let subtype = match font.get(b"Subtype").ok().map(|obj| resolve(doc, obj)) {
            Some(Object::Name(name)) => name.clone(),
            _ => Vec::new(),
        };
        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| match resolve(doc, obj) {
                Object::Stream(stream) => Some(parse_to_unicode(&decoded_stream(stream))),
                _ => None,
            })
            .unwrap_or_default();

        if subtype == b"Type0" {
            let descendant = dict_array(doc, font, b"DescendantFonts")
                .and_then(|fonts| fonts.first())
                .and_then(|obj| as_dict(doc, obj));
            let (widths, default_width, descent) = match descendant {
                Some(cid_font) => (
                    cid_widths(doc, cid_font),
                    dict_number(doc, cid_font, b"DW").unwrap_or(1000.0),
                    descriptor_descent(doc, cid_font),
                ),
                None => (HashMap::new(), 1000.0, 0.0),
            };
            return Self {
                two_byte: true,
                widths,
                default_width,
                descent,
                to_unicode,
            };
        }

        let mut widths = HashMap::new();
        if let (Some(first), Some(list)) = (
            dict_number(doc, font, b"FirstChar"),
            dict_array(doc, font, b"Widths"),
        ) {
            for (offset, width) in list.iter().enumerate() {
                if let Some(width) = number(resolve(doc, width)) {
                    widths.insert(first as u32 + offset as u32, width);
                }
            }
        }
        let default_width = font
            .get(b"FontDescriptor")
            .ok()
            .and_then(|obj| as_dict(doc, obj))
            .and_then(|descriptor| dict_number(doc, descriptor, b"MissingWidth"))
            .filter(|width| *width > 0.0)
            .unwrap_or(FALLBACK_WIDTH);

        Self {
            two_byte: false,
            widths,
            default_width,
            descent: descriptor_descent(doc, font),
            to_unicode,
        }
    }

    fn width(&self, code: u32) -> f64 {
        self.widths.get(&code).copied().unwrap_or(self.default_width) / 1000.0
    }

    fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| pair.iter().fold(0u32, |acc, b| acc << 8 | u32::from(*b)))
                .collect()
        } else {
            bytes.iter().map(|b| u32::from(*b)).collect()
        }
    }

    fn text(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.get(&code) {
            return text.clone();
        }
        if self.two_byte {
            return format!("(cid:{code})");
        }
        win_ansi(code as u8).to_string()
    }
}

fn descriptor_descent(doc: &Document, font: &Dictionary) -> f64 {
    font.get(b"FontDescriptor")
        .ok()
        .and_then(|obj| as_dict(doc, obj))
        .and_then(|descriptor| dict_number(doc, descriptor, b"Descent"))
        .unwrap_or(0.0)
}

/// Clamp a numeric code operand into `0..=MAX_CODE`.
fn code_number(value: f64) -> u32 {
    value.clamp(0.0, f64::from(MAX_CODE)) as u32
}

/// Parse the `/W` array of a CID font: `c [w1 w2 ...]` and `c_first c_last w`.
fn cid_widths(doc: &Document, cid_font: &Dictionary) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let Some(items) = dict_array(doc, cid_font, b"W") else {
        return widths;
    };

    let mut index = 0;
    while index < items.len() {
        let Some(first) = number(resolve(doc, &items[index])).map(code_number) else {
            break;
        };
        match items.get(index + 1).map(|obj| resolve(doc, obj)) {
            Some(Object::Array(list)) => {
                for (code, width) in (first..=MAX_CODE).zip(list) {
                    if let Some(width) = number(resolve(doc, width)) {
                        widths.insert(code, width);
                    }
                }
                index += 2;
            }
            Some(last) => {
                let (Some(last), Some(width)) = (
                    number(last),
                    items.get(index + 2).and_then(|obj| number(resolve(doc, obj))),
                ) else {
                    break;
                };
                for code in first..=code_number(last) {
                    widths.insert(code, width);
                }
                index += 3;
            }
            None => break,
        }
    }
    widths
}

/// Parse the `bfchar` / `bfrange` sections of a ToUnicode CMap.
fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    let text = String::from_utf8_lossy(data);
    let tokens = cmap_tokens(&text);
    let mut map = HashMap::new();

    let mut index = 0;
    while index < tokens.len() {
        match tokens[index].as_str() {
            "beginbfchar" => {
                index += 1;
                while index + 1 < tokens.len() && tokens[index] != "endbfchar" {
                    if let (Some(code), Some(dest)) = (hex_code(&tokens[index]), hex_utf16(&tokens[index + 1])) {
                        map.insert(code, dest);
                    }
                    index += 2;
                }
            }
            "beginbfrange" => {
                index += 1;
                while index + 2 < tokens.len() && tokens[index] != "endbfrange" {
                    let (Some(low), Some(high)) = (hex_code(&tokens[index]), hex_code(&tokens[index + 1])) else {
                        index += 1;
                        continue;
                    };
                    let high = high.min(MAX_CODE);
                    if tokens[index + 2] == "[" {
                        let mut cursor = index + 3;
                        let mut code = Some(low).filter(|code| *code <= MAX_CODE);
                        while cursor < tokens.len() && tokens[cursor] != "]" {
                            if let (Some(current), Some(dest)) = (code, hex_utf16(&tokens[cursor])) {
                                map.insert(current, dest);
                            }
                            code = code.and_then(|c| c.checked_add(1)).filter(|c| *c <= MAX_CODE);
                            cursor += 1;
                        }
                        index = cursor + 1;
                    } else {
                        if let Some(start) = hex_utf16(&tokens[index + 2]) {
                            let units: Vec<u16> = start.encode_utf16().collect();
                            for (step, code) in (low..=high).enumerate() {
                                let mut units = units.clone();
                                if let Some(last) = units.last_mut() {
                                    *last = last.wrapping_add(step as u16);
                                }
                                map.insert(code, String::from_utf16_lossy(&units));
                            }
                        }
                        index += 3;
                    }
                }
            }
            _ => {}
        }
        index += 1;
    }
    map
}

/// Split CMap text into `<hex>` strings, brackets and bare words.
fn cmap_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                let mut token = String::from("<");
                for next in chars.by_ref() {
                    token.push(next);
                    if next == '>' {
                        break;
                    }
                }
                tokens.push(token);
            }
            '[' | ']' => tokens.push(ch.to_string()),
            c if c.is_whitespace() => {}
            _ => {
                let mut token = ch.to_string();
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '<' | '[' | ']') {
                        break;
                    }
                    token.push(next);
                    chars.next();
                }
                tokens.push(token);
            }
        }
    }
    tokens
}

fn hex_bytes(token: &str) -> Option<Vec<u8>> {
    let hex: String = token
        .strip_prefix('<')?
        .strip_suffix('>')?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if hex.is_empty() || hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

fn hex_code(token: &str) -> Option<u32> {
    let bytes = hex_bytes(token)?;
    Some(bytes.iter().fold(0u32, |acc, b| acc << 8 | u32::from(*b)))
}

fn hex_utf16(token: &str) -> Option<String> {
    let bytes = hex_bytes(token)?;
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => u16::from(*single),
            _ => 0,
        })
        .collect();
    Some(String::from_utf16_lossy(&units))
}

/// Single-byte decoding for fonts without a ToUnicode map: Latin-1 with the
/// Windows-1252 punctuation block.
fn win_ansi(code: u8) -> char {
    match code {
        0x80 => '€',
        0x85 => '…',
        0x91 => '‘',
        0x92 => '’',
        0x93 => '“',
        0x94 => '”',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        other => char::from(other),
    }
}

// -- Interpreter --------------------------------------------------------------

/// Graphics and text state saved by `q` / restored by `Q`.
#[derive(Debug, Clone)]
struct State {
    ctm: Matrix,
    char_spacing: f64,
    word_spacing: f64,
    /// Horizontal scaling as a factor (`Tz / 100`).
    scaling: f64,
    leading: f64,
    rise: f64,
    font_size: f64,
    font: Option<Vec<u8>>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            char_spacing: 0.0,
            word_spacing: 0.0,
            scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
            font_size: 0.0,
            font: None,
        }
    }
}

/// Identity of a font dictionary: its object id, or its address when the
/// dictionary is inline in a resource dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FontKey {
    Object(ObjectId),
    Inline(usize),
}

struct Interpreter<'a> {
    doc: &'a Document,
    state: State,
    stack: Vec<State>,
    /// Text matrix and the running offset inside the current line.
    text_matrix: Matrix,
    line_offset: (f64, f64),
    /// Char spacing is due before the next glyph of the current show operator.
    pending_char_space: bool,
    fonts: HashMap<FontKey, FontMetrics>,
    glyphs: Vec<Glyph>,
}

impl<'a> Interpreter<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            state: State::default(),
            stack: Vec::new(),
            text_matrix: IDENTITY,
            line_offset: (0.0, 0.0),
            pending_char_space: false,
            fonts: HashMap::new(),
            glyphs: Vec::new(),
        }
    }

    fn run(&mut self, content: &Content, resources: Option<&'a Dictionary>, depth: usize) {
        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => self.stack.push(self.state.clone()),
                "Q" => {
                    if let Some(state) = self.stack.pop() {
                        self.state = state;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operands(operands) {
                        self.state.ctm = multiply(&m, &self.state.ctm);
                    }
                }
                "BT" => {
                    self.text_matrix = IDENTITY;
                    self.line_offset = (0.0, 0.0);
                }
                "ET" => {}
                "Tc" => self.set_scalar(operands, |s, v| s.char_spacing = v),
                "Tw" => self.set_scalar(operands, |s, v| s.word_spacing = v),
                "Tz" => self.set_scalar(operands, |s, v| s.scaling = v / 100.0),
                "TL" => self.set_scalar(operands, |s, v| s.leading = v),
                "Ts" => self.set_scalar(operands, |s, v| s.rise = v),
                "Tf" => {
                    if let [name, size, ..] = operands {
                        if let Object::Name(name) = name {
                            self.state.font = Some(name.clone());
                        }
                        if let Some(size) = number(size) {
                            self.state.font_size = size;
                        }
                    }
                }
                "Td" => {
                    if let [tx, ty, ..] = operands {
                        self.move_line(number(tx).unwrap_or(0.0), number(ty).unwrap_or(0.0));
                    }
                }
                "TD" => {
                    if let [tx, ty, ..] = operands {
                        let ty = number(ty).unwrap_or(0.0);
                        self.state.leading = -ty;
                        self.move_line(number(tx).unwrap_or(0.0), ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_operands(operands) {
                        self.text_matrix = m;
                        self.line_offset = (0.0, 0.0);
                    }
                }
                "T*" => self.next_line(),
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.pending_char_space = false;
                        self.show(bytes, resources);
                    }
                }
                "'" => {
                    self.next_line();
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.pending_char_space = false;
                        self.show(bytes, resources);
                    }
                }
                "\"" => {
                    if let [aw, ac, Object::String(bytes, _), ..] = operands {
                        self.state.word_spacing = number(aw).unwrap_or(0.0);
                        self.state.char_spacing = number(ac).unwrap_or(0.0);
                        self.next_line();
                        self.pending_char_space = false;
                        self.show(bytes, resources);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.pending_char_space = false;
                        for item in items {
                            match item {
                                Object::String(bytes, _) => self.show(bytes, resources),
                                other => {
                                    if let Some(adjust) = number(other) {
                                        self.line_offset.0 -=
                                            adjust * 0.001 * self.state.font_size * self.state.scaling;
                                        self.pending_char_space = true;
                                    }
                                }
                            }
                        }
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.draw_xobject(name, resources, depth);
                    }
                }
                _ => {}
            }
        }
    }

    fn set_scalar(&mut self, operands: &[Object], set: impl FnOnce(&mut State, f64)) {
        if let Some(value) = operands.first().and_then(number) {
            set(&mut self.state, value);
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.text_matrix = translate(&self.text_matrix, tx, ty);
        self.line_offset = (0.0, 0.0);
    }

    fn next_line(&mut self) {
        let leading = self.state.leading;
        self.move_line(0.0, -leading);
    }

    /// Metrics of the current font, cached per font dictionary so equal
    /// resource names in different forms stay apart.
    fn font_metrics(&mut self, resources: Option<&'a Dictionary>) -> FontMetrics {
        let Some(name) = self.state.font.as_deref() else {
            return FontMetrics::fallback();
        };
        let doc = self.doc;
        let entry = resources
            .and_then(|res| res.get(b"Font").ok())
            .and_then(|fonts| as_dict(doc, fonts))
            .and_then(|fonts| fonts.get(name).ok());
        let Some((key, font)) = entry.and_then(|obj| {
            let key = match obj {
                Object::Reference(id) => FontKey::Object(*id),
                inline => FontKey::Inline(std::ptr::from_ref(inline) as usize),
            };
            as_dict(doc, obj).map(|font| (key, font))
        }) else {
            warn!(font = %String::from_utf8_lossy(name), "Font resource not found; using fallback metrics");
            return FontMetrics::fallback();
        };

        self.fonts
            .entry(key)
            .or_insert_with(|| FontMetrics::load(doc, font))
            .clone()
    }

    /// Emit one glyph per character code of `bytes` and advance the line.
    /// Char spacing goes between glyphs of one show operator, not after the
    /// last one.
    fn show(&mut self, bytes: &[u8], resources: Option<&'a Dictionary>) {
        let metrics = self.font_metrics(resources);
        let size = self.state.font_size;
        let scaling = self.state.scaling;
        let base = multiply(&self.text_matrix, &self.state.ctm);
        let descent = metrics.descent / 1000.0 * size;
        let rise = self.state.rise;

        for code in metrics.codes(bytes) {
            if self.pending_char_space {
                self.line_offset.0 += self.state.char_spacing * scaling;
            }
            let advance = metrics.width(code) * size * scaling;
            let m = translate(&base, self.line_offset.0, self.line_offset.1);
            let (ax, ay) = apply(&m, 0.0, descent + rise);
            let (bx, by) = apply(&m, advance, descent + rise + size);

            self.glyphs.push(Glyph {
                text: metrics.text(code),
                x0: ax.min(bx),
                y0: ay.min(by),
                x1: ax.max(bx),
                y1: ay.max(by),
            });

            self.line_offset.0 += advance;
            if code == 32 && !metrics.two_byte {
                self.line_offset.0 += self.state.word_spacing * scaling;
            }
            self.pending_char_space = true;
        }
    }

    fn draw_xobject(&mut self, name: &[u8], resources: Option<&'a Dictionary>, depth: usize) {
        if depth >= MAX_FORM_DEPTH {
            warn!(depth, "Form XObject nesting too deep; skipped");
            return;
        }
        let doc = self.doc;
        let Some(stream) = resources
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|xobjects| as_dict(doc, xobjects))
            .and_then(|xobjects| xobjects.get(name).ok())
            .and_then(|obj| match resolve(doc, obj) {
                Object::Stream(stream) => Some(stream),
                _ => None,
            })
        else {
            return;
        };

        let is_form = matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(subtype)) if subtype == b"Form");
        if !is_form {
            return;
        }

        let content = match Content::decode(&decoded_stream(stream)) {
            Ok(content) => content,
            Err(err) => {
                warn!(%err, "Cannot decode Form XObject content; skipped");
                return;
            }
        };
        let form_matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|obj| match resolve(doc, obj) {
                Object::Array(items) => matrix_operands(items),
                _ => None,
            })
            .unwrap_or(IDENTITY);
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|obj| as_dict(doc, obj))
            .or(resources);

        let saved_state = self.state.clone();
        let saved_text = (self.text_matrix, self.line_offset);
        let saved_depth = self.stack.len();

        self.state.ctm = multiply(&form_matrix, &self.state.ctm);
        self.run(&content, form_resources, depth + 1);

        self.stack.truncate(saved_depth);
        self.state = saved_state;
        (self.text_matrix, self.line_offset) = saved_text;
    }
}
