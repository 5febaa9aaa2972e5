use super::sanitize::sanitize;
use super::{ScanOutput, SourceScanner};
use crate::model::{Symbol, SymbolKind, SymbolLocation, SymbolReference};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

// `function name(params) [: Parent(args)] [constructor]`
static FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bfunction\s+([A-Za-z_]\w*)\s*\(([^)]*)\)(?:\s*:\s*[A-Za-z_]\w*\s*\([^)]*\))?\s*(constructor\b)?",
    )
    .expect("invalid function declaration pattern")
});

// `[static |global.]name = function(params) [: Parent(args)] [constructor]`
static FUNCTION_ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:static\s+|global\s*\.\s*)?([A-Za-z_]\w*)\s*=\s*function\s*\(([^)]*)\)(?:\s*:\s*[A-Za-z_]\w*\s*\([^)]*\))?\s*(constructor\b)?",
    )
    .expect("invalid function assignment pattern")
});

static MACRO_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*#macro\s+(?:[A-Za-z_]\w*:)?([A-Za-z_]\w*)").expect("invalid macro pattern")
});

static ENUM_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*enum\s+([A-Za-z_]\w*)").expect("invalid enum pattern"));

static ENUM_MEMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|,)\s*([A-Za-z_]\w*)").expect("invalid enum member pattern"));

static GLOBALVAR_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*globalvar\s+([^;]*)").expect("invalid globalvar pattern"));

static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_]\w*").expect("invalid identifier pattern"));

static CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z_]\w*)\s*\(").expect("invalid call pattern"));

const KEYWORDS: &[&str] = &[
    "if", "else", "while", "for", "do", "until", "repeat", "switch", "case", "with", "return",
    "function", "constructor", "catch", "try", "throw", "finally", "new", "delete", "and", "or",
    "not", "xor", "mod", "div", "static", "var", "globalvar", "enum", "exit", "break", "continue",
    "default", "then", "begin", "end",
];

/// Line-oriented GML scanner.
///
/// Recognizes function/constructor declarations (both `function name()` and
/// `name = function()` forms), `#macro`, `enum` with members, and
/// `globalvar`. Every non-keyword `identifier(` outside comments and strings
/// is recorded as a reference.
#[derive(Debug, Default, Clone, Copy)]
pub struct GmlScanner;

impl GmlScanner {
    pub fn new() -> Self {
        Self
    }
}

struct OpenEnum {
    symbol: usize,
    name: String,
    body_started: bool,
}

struct FileScan<'a> {
    file_path: &'a Path,
    raw: Vec<&'a str>,
    clean: Vec<String>,
    symbols: Vec<Symbol>,
    // (line index, byte offset) of every definition name, so the reference
    // pass does not count a declaration as a use of itself.
    def_sites: HashSet<(usize, usize)>,
}

fn char_col(line: &str, byte: usize) -> usize {
    line[..byte].chars().count() + 1
}

fn split_parameters(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| p.split('=').next().unwrap_or("").trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

impl<'a> FileScan<'a> {
    fn new(content: &'a str, file_path: &'a Path) -> Self {
        Self {
            file_path,
            raw: content.lines().collect(),
            clean: sanitize(content),
            symbols: Vec::new(),
            def_sites: HashSet::new(),
        }
    }

    fn location(&self, line_idx: usize, byte: usize) -> SymbolLocation {
        SymbolLocation::new(
            self.file_path,
            line_idx + 1,
            char_col(&self.clean[line_idx], byte),
        )
    }

    fn push_definition(&mut self, name: &str, kind: SymbolKind, line_idx: usize, byte: usize) -> usize {
        let location = self.location(line_idx, byte);
        self.def_sites.insert((line_idx, byte));
        self.symbols.push(Symbol::new(name, kind, location));
        self.symbols.len() - 1
    }

    /// The `///` block directly above `line_idx`, prefixes stripped.
    fn doc_comment(&self, line_idx: usize) -> Option<String> {
        let mut lines = Vec::new();
        for raw in self.raw[..line_idx].iter().rev() {
            let trimmed = raw.trim_start();
            match trimmed.strip_prefix("///") {
                Some(rest) => lines.push(rest.strip_prefix(' ').unwrap_or(rest).trim_end()),
                None => break,
            }
        }
        if lines.is_empty() {
            return None;
        }
        lines.reverse();
        Some(lines.join("\n"))
    }

    /// End of the brace block opened after `(line_idx, from)`, as a 1-based
    /// (line, column) of the closing brace. A `;` before any `{` means there
    /// is no body.
    fn block_end(&self, line_idx: usize, from: usize) -> Option<(usize, usize)> {
        let mut depth = 0usize;
        for (li, text) in self.clean.iter().enumerate().skip(line_idx) {
            let start = if li == line_idx { from } else { 0 };
            for (off, ch) in text[start..].char_indices() {
                match ch {
                    '{' => depth += 1,
                    '}' if depth > 0 => {
                        depth -= 1;
                        if depth == 0 {
                            return Some((li + 1, char_col(text, start + off)));
                        }
                    }
                    ';' if depth == 0 => return None,
                    _ => {}
                }
            }
        }
        None
    }

    fn function_definition(&mut self, line_idx: usize, caps: &regex::Captures<'_>) {
        let (Some(name), Some(params)) = (caps.get(1), caps.get(2)) else {
            return;
        };
        let Some(whole) = caps.get(0) else {
            return;
        };
        let kind = if caps.get(3).is_some() {
            SymbolKind::Constructor
        } else {
            SymbolKind::Function
        };

        let idx = self.push_definition(name.as_str(), kind, line_idx, name.start());
        let doc = self.doc_comment(line_idx);
        let end = self.block_end(line_idx, whole.end());

        let symbol = &mut self.symbols[idx];
        symbol.parameters = split_parameters(params.as_str());
        symbol.doc_comment = doc;
        if let Some((end_line, end_column)) = end {
            symbol.location.end_line = Some(end_line);
            symbol.location.end_column = Some(end_column);
        }
    }

    /// Consumes enum members on one line starting at byte `from`.
    /// Returns true once the closing brace has been seen.
    fn enum_segment(&mut self, open: &mut OpenEnum, line_idx: usize, from: usize) -> bool {
        let line = self.clean[line_idx].clone();
        let mut start = from;
        if !open.body_started {
            match line[from..].find('{') {
                Some(p) => {
                    open.body_started = true;
                    start = from + p + 1;
                }
                None => return false,
            }
        }

        let close = line[start..].find('}').map(|p| start + p);
        let body = &line[start..close.unwrap_or(line.len())];

        for caps in ENUM_MEMBER.captures_iter(body) {
            if let Some(member) = caps.get(1) {
                let idx = self.push_definition(
                    member.as_str(),
                    SymbolKind::EnumMember,
                    line_idx,
                    start + member.start(),
                );
                self.symbols[idx].parent_enum = Some(open.name.clone());
            }
        }

        match close {
            Some(close) => {
                let column = char_col(&line, close);
                let location = &mut self.symbols[open.symbol].location;
                location.end_line = Some(line_idx + 1);
                location.end_column = Some(column);
                true
            }
            None => false,
        }
    }

    fn definitions(&mut self) {
        let mut open_enum: Option<OpenEnum> = None;

        for line_idx in 0..self.clean.len() {
            if let Some(mut open) = open_enum.take() {
                if !self.enum_segment(&mut open, line_idx, 0) {
                    open_enum = Some(open);
                }
                continue;
            }

            let line = self.clean[line_idx].clone();

            for caps in FUNCTION_DECL.captures_iter(&line) {
                self.function_definition(line_idx, &caps);
            }
            if let Some(caps) = FUNCTION_ASSIGN.captures(&line) {
                self.function_definition(line_idx, &caps);
            }

            if let Some(name) = MACRO_DECL.captures(&line).and_then(|c| c.get(1)) {
                self.push_definition(name.as_str(), SymbolKind::Macro, line_idx, name.start());
            }

            if let Some(caps) = GLOBALVAR_DECL.captures(&line) {
                if let Some(list) = caps.get(1) {
                    for name in IDENT.find_iter(list.as_str()) {
                        self.push_definition(
                            name.as_str(),
                            SymbolKind::GlobalVar,
                            line_idx,
                            list.start() + name.start(),
                        );
                    }
                }
            }

            if let Some(name) = ENUM_DECL.captures(&line).and_then(|c| c.get(1)) {
                let symbol = self.push_definition(name.as_str(), SymbolKind::Enum, line_idx, name.start());
                let mut open = OpenEnum {
                    symbol,
                    name: name.as_str().to_string(),
                    body_started: false,
                };
                if !self.enum_segment(&mut open, line_idx, name.end()) {
                    open_enum = Some(open);
                }
            }
        }
    }

    fn references(&self) -> Vec<SymbolReference> {
        let mut refs = Vec::new();
        for (line_idx, line) in self.clean.iter().enumerate() {
            for caps in CALL.captures_iter(line) {
                let Some(name) = caps.get(1) else {
                    continue;
                };
                if KEYWORDS.contains(&name.as_str())
                    || self.def_sites.contains(&(line_idx, name.start()))
                {
                    continue;
                }
                let mut reference =
                    SymbolReference::new(name.as_str(), self.location(line_idx, name.start()));
                reference.context = Some(self.raw[line_idx].trim().to_string());
                refs.push(reference);
            }
        }
        refs
    }
}

impl SourceScanner for GmlScanner {
    fn scan_content(&self, content: &str, file_path: &Path) -> ScanOutput {
        let mut scan = FileScan::new(content, file_path);
        scan.definitions();
        let references = scan.references();
        ScanOutput {
            symbols: scan.symbols,
            references,
        }
    }
}
