//! Lexical scanner for Visual Basic.
//!
//! There is no maintained tree-sitter grammar for Visual Basic, so names are
//! found with regular expressions over the source with comments and string
//! literals blanked out. Offsets are preserved by the blanking, so spans
//! point into the original text.

use super::{compact_dotted, NameContext, NameNode, NamespaceScope, SyntaxParts, TextSpan, TypeDeclaration};
use regex::Regex;
use std::sync::OnceLock;

const KEYWORDS: &[&str] = &[
    "addhandler", "addressof", "and", "andalso", "as", "boolean", "byref", "byte", "byval", "call",
    "case", "catch", "cbool", "cchar", "cdate", "cdbl", "cint", "class", "clng", "cobj", "const",
    "continue", "cstr", "ctype", "date", "decimal", "declare", "default", "delegate", "dim",
    "directcast", "do", "double", "each", "else", "elseif", "end", "enum", "erase", "error",
    "event", "exit", "false", "finally", "for", "friend", "function", "get", "gettype", "global",
    "handles", "if", "implements", "imports", "in", "inherits", "integer", "interface", "is",
    "isnot", "let", "lib", "like", "long", "loop", "me", "mod", "module", "mustinherit",
    "mustoverride", "mybase", "myclass", "namespace", "narrowing", "new", "next", "not",
    "nothing", "notinheritable", "notoverridable", "object", "of", "on", "operator", "option",
    "optional", "or", "orelse", "overloads", "overridable", "overrides", "paramarray", "partial",
    "private", "property", "protected", "public", "raiseevent", "readonly", "redim", "removehandler",
    "resume", "return", "sbyte", "select", "set", "shadows", "shared", "short", "single", "static",
    "step", "stop", "string", "structure", "sub", "synclock", "then", "throw", "to", "true", "try",
    "trycast", "typeof", "uinteger", "ulong", "ushort", "using", "when", "while", "widening", "with",
    "withevents", "writeonly", "xor", "async", "await", "iterator", "yield",
];

/// Keywords whose following identifier is a declared name, not a reference.
const DECLARING: &[&str] = &[
    "class", "structure", "interface", "module", "enum", "sub", "function", "property", "event",
    "dim", "const", "delegate", "namespace", "operator",
];

/// Keywords that put the following dotted name in a type position.
const TYPE_POSITION: &[&str] = &["as", "new", "inherits", "implements", "of", "gettype", "is", "typeof"];

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[([A-Za-z_][A-Za-z0-9_]*)\]|[A-Za-z_][A-Za-z0-9_]*").expect("Invalid identifier regex")
    })
}

fn imports_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*Imports[ \t]+(?:([A-Za-z_]\w*)[ \t]*=[ \t]*)?([A-Za-z_][\w.]*)[^\n]*")
            .expect("Invalid imports regex")
    })
}

fn namespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*(?:(End)[ \t]+Namespace\b|Namespace[ \t]+([A-Za-z_][\w.]*))")
            .expect("Invalid namespace regex")
    })
}

fn type_declaration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?im)^[ \t]*(?:(?:Public|Private|Friend|Protected|Partial|MustInherit|NotInheritable|Shadows|Static)[ \t]+)*(?:Class|Structure|Interface|Module|Enum)[ \t]+([A-Za-z_]\w*)",
        )
        .expect("Invalid type declaration regex")
    })
}

pub(super) fn parse(text: &str) -> SyntaxParts {
    let masked = mask_comments_and_strings(text);
    let mut parts = SyntaxParts::default();

    for caps in imports_regex().captures_iter(&masked) {
        let (Some(line), Some(target)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        if caps.get(1).is_none() {
            parts.imports.push(compact_dotted(target.as_str()));
        }
        parts.import_spans.push(TextSpan::new(line.start(), line.end()));
    }

    collect_namespaces(&masked, &mut parts);

    for caps in type_declaration_regex().captures_iter(&masked) {
        let Some(name) = caps.get(1) else { continue };
        let namespace = innermost_namespace(&parts.namespaces, name.start());
        parts.declarations.push(TypeDeclaration {
            namespace,
            name: name.as_str().to_string(),
        });
    }

    collect_names(&masked, &mut parts);
    parts
}

/// Blanks comments, string literals and preprocessor lines with spaces.
fn mask_comments_and_strings(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;
    let mut line_start = true;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\n' {
            line_start = true;
            i += 1;
            continue;
        }
        if line_start && (b == b' ' || b == b'\t') {
            i += 1;
            continue;
        }
        let at_line_start = line_start;
        line_start = false;

        if b == b'"' {
            out[i] = b' ';
            i += 1;
            while i < bytes.len() && bytes[i] != b'\n' {
                if bytes[i] == b'"' {
                    if bytes.get(i + 1) == Some(&b'"') {
                        out[i] = b' ';
                        out[i + 1] = b' ';
                        i += 2;
                        continue;
                    }
                    out[i] = b' ';
                    i += 1;
                    break;
                }
                out[i] = b' ';
                i += 1;
            }
            continue;
        }

        let rem = (at_line_start || bytes[i - 1].is_ascii_whitespace() || bytes[i - 1] == b':')
            && bytes.len() >= i + 4
            && bytes[i..i + 3].eq_ignore_ascii_case(b"rem")
            && bytes.get(i + 3).map_or(true, |c| c.is_ascii_whitespace());
        if b == b'\'' || (at_line_start && b == b'#') || rem {
            while i < bytes.len() && bytes[i] != b'\n' {
                out[i] = b' ';
                i += 1;
            }
            continue;
        }
        i += 1;
    }

    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn collect_namespaces(masked: &str, parts: &mut SyntaxParts) {
    let mut open: Vec<(String, usize)> = Vec::new();
    for caps in namespace_regex().captures_iter(masked) {
        let Some(whole) = caps.get(0) else { continue };
        if caps.get(1).is_some() {
            if let Some((name, start)) = open.pop() {
                parts.namespaces.push(NamespaceScope {
                    name,
                    span: TextSpan::new(start, whole.end()),
                });
            }
        } else if let Some(name) = caps.get(2) {
            let local = compact_dotted(name.as_str());
            let full = match open.last() {
                Some((outer, _)) => format!("{}.{}", outer, local),
                None => local,
            };
            open.push((full, whole.start()));
        }
    }
    // unterminated blocks run to the end of the file
    for (name, start) in open {
        parts.namespaces.push(NamespaceScope {
            name,
            span: TextSpan::new(start, masked.len()),
        });
    }
}

fn innermost_namespace(scopes: &[NamespaceScope], offset: usize) -> Option<String> {
    scopes
        .iter()
        .filter(|s| s.span.contains(offset))
        .max_by_key(|s| s.span.start)
        .map(|s| s.name.clone())
}

struct Token<'a> {
    text: &'a str,
    span: TextSpan,
    is_keyword: bool,
}

/// Dotted name being read.
struct Chain<'a> {
    names: Vec<&'a str>,
    start: usize,
    context: NameContext,
    /// Declared names are read but not reported.
    declared: bool,
}

fn collect_names(masked: &str, parts: &mut SyntaxParts) {
    let tokens: Vec<Token> = identifier_regex()
        .captures_iter(masked)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            // `[Name]` escapes a keyword; the span covers the brackets
            let escaped = caps.get(1);
            let text = escaped.map_or(whole.as_str(), |m| m.as_str());
            Some(Token {
                text,
                span: TextSpan::new(whole.start(), whole.end()),
                is_keyword: escaped.is_none() && KEYWORDS.contains(&text.to_lowercase().as_str()),
            })
        })
        .collect();

    let mut chain: Option<Chain> = None;
    let mut previous: Option<&Token> = None;

    for token in &tokens {
        let line_start = masked[..token.span.start].rfind('\n').map_or(0, |i| i + 1);
        let gap = previous.map(|p| &masked[p.span.end..token.span.start]);
        let same_line = gap.is_some_and(|g| !g.contains('\n'));
        let prev = previous.replace(token);

        if token.is_keyword {
            chain = None;
            continue;
        }

        if let Some(current) = chain.as_mut() {
            if same_line && gap.is_some_and(|g| g.trim() == ".") {
                if !current.declared {
                    let context = match current.context {
                        NameContext::Attribute if !followed_by_dot(masked, token) => NameContext::Attribute,
                        NameContext::Attribute | NameContext::Qualified => NameContext::Qualified,
                        NameContext::Import => NameContext::Import,
                        _ => NameContext::MemberAccess,
                    };
                    push(parts, token, Some(current.names.join(".")), current.start, context, masked);
                }
                current.names.push(token.text);
                continue;
            }
        }

        let keyword_before = prev
            .filter(|p| p.is_keyword && same_line)
            .map(|p| p.text.to_lowercase());
        let declared = keyword_before
            .as_deref()
            .is_some_and(|k| DECLARING.contains(&k))
            && gap.is_some_and(|g| g.trim().is_empty());
        if declared {
            chain = Some(Chain {
                names: vec![token.text],
                start: token.span.start,
                context: NameContext::Simple,
                declared: true,
            });
            continue;
        }

        if masked[line_start..token.span.start].trim_end().ends_with('.') {
            // member access on an expression such as a call result
            push(parts, token, None, token.span.start, NameContext::MemberAccess, masked);
            chain = Some(Chain {
                names: vec![token.text],
                start: token.span.start,
                context: NameContext::Simple,
                declared: false,
            });
            continue;
        }

        let type_position = keyword_before
            .as_deref()
            .is_some_and(|k| TYPE_POSITION.contains(&k));
        let context = chain_context_for(masked, line_start, token, type_position);
        let first = match context {
            NameContext::Attribute if !followed_by_dot(masked, token) => NameContext::Attribute,
            NameContext::Import => NameContext::Import,
            _ => NameContext::Simple,
        };
        push(parts, token, None, token.span.start, first, masked);
        chain = Some(Chain {
            names: vec![token.text],
            start: token.span.start,
            context,
            declared: false,
        });
    }
}

fn chain_context_for(masked: &str, line_start: usize, token: &Token, type_position: bool) -> NameContext {
    let line_prefix = masked[line_start..token.span.start].trim();
    if line_prefix.eq_ignore_ascii_case("imports") || line_prefix.to_lowercase().starts_with("imports ") {
        return NameContext::Import;
    }
    let before = line_prefix.trim_end_matches(|c: char| c.is_whitespace());
    let attribute_open = before.ends_with('<')
        || before.to_lowercase().ends_with("<assembly:")
        || before.to_lowercase().ends_with("<module:")
        || (before.ends_with(',') && before.contains('<') && !before.contains('>'));
    if attribute_open && closes_attribute(masked, token) {
        return NameContext::Attribute;
    }
    if type_position {
        NameContext::Qualified
    } else {
        NameContext::Simple
    }
}

/// The dotted name starting at `token` is followed by `(`, `>` or `,`.
fn closes_attribute(masked: &str, token: &Token) -> bool {
    let rest = &masked[token.span.end..];
    let after_name = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == ' ');
    matches!(after_name.chars().next(), Some('(') | Some('>') | Some(','))
}

fn followed_by_dot(masked: &str, token: &Token) -> bool {
    masked[token.span.end..].trim_start_matches([' ', '\t']).starts_with('.')
}

fn push(
    parts: &mut SyntaxParts,
    token: &Token,
    qualifier: Option<String>,
    chain_start: usize,
    context: NameContext,
    masked: &str,
) {
    let is_generic = {
        let rest = masked[token.span.end..].trim_start();
        rest.starts_with('(')
            && rest[1..]
                .trim_start()
                .get(..2)
                .is_some_and(|of| of.eq_ignore_ascii_case("of"))
    };
    let full_start = if qualifier.is_some() { chain_start } else { token.span.start };
    parts.names.push(NameNode {
        simple_name: token.text.to_string(),
        qualifier,
        context,
        is_generic,
        span: token.span,
        full_span: TextSpan::new(full_start, token.span.end),
    });
}
