//! Declaration extraction from tree-sitter parse trees
//!
//! Chunkable constructs are modeled as a closed set of declaration kinds.
//! Each supported language maps its tree-sitter node kinds into that set;
//! anything that does not map is not a chunk boundary (the walk still
//! descends into it, so nested declarations are found).

use crate::error::ChunkingError;
use crate::indexer::language::ParsedLanguage;
use anyhow::{Context, Result};
use tree_sitter::{Node, Parser};

/// The closed set of syntactic constructs that form structural chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Function,
    Class,
    Interface,
    Enum,
    TypeAlias,
    Method,
    Constructor,
    /// Top-level variable/const declaration group
    VariableGroup,
}

impl DeclKind {
    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            DeclKind::Function | DeclKind::Method | DeclKind::Constructor
        )
    }
}

/// One chunkable declaration found in a parse tree
#[derive(Debug, Clone)]
pub struct Declaration {
    pub kind: DeclKind,
    /// The tree-sitter node kind that produced this declaration
    pub node_type: String,
    /// Declared name, or ", "-joined names for multi-declarator groups
    pub symbol: Option<String>,
    /// 1-based, inclusive
    pub start_line: usize,
    pub end_line: usize,
}

/// Parser wrapper that extracts chunkable declarations for one language
pub struct AstParser {
    parser: Parser,
    language: ParsedLanguage,
}

impl AstParser {
    pub fn new(language: ParsedLanguage) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&language.grammar())
            .with_context(|| {
                ChunkingError::UnsupportedLanguage(language.name().to_string()).to_string()
            })?;

        Ok(Self { parser, language })
    }

    pub fn language(&self) -> ParsedLanguage {
        self.language
    }

    /// Parse source text and collect every chunkable declaration, in
    /// traversal order
    pub fn declarations(&mut self, source: &str) -> Result<Vec<Declaration>> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ChunkingError::ParseFailed(self.language.name().to_string()))?;

        let root = tree.root_node();
        let mut found = Vec::new();
        self.visit(root, root, source, &mut found);
        Ok(found)
    }

    fn visit(&self, node: Node, root: Node, source: &str, found: &mut Vec<Declaration>) {
        let top_level = is_top_level(node, root);

        if let Some(kind) = classify(self.language, node.kind(), top_level) {
            let symbol = extract_symbol(self.language, node, source);
            let kind = refine_constructor(self.language, kind, symbol.as_deref());

            found.push(Declaration {
                kind,
                node_type: node.kind().to_string(),
                symbol,
                // Tree-sitter rows are 0-indexed
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
            });
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, root, source, found);
        }
    }
}

/// A node is top-level when its parent is the file root, or when it sits
/// directly inside a top-level export statement
fn is_top_level(node: Node, root: Node) -> bool {
    match node.parent() {
        None => false,
        Some(parent) if parent.id() == root.id() => true,
        Some(parent) => {
            parent.kind() == "export_statement"
                && parent.parent().is_some_and(|gp| gp.id() == root.id())
        }
    }
}

/// Map a tree-sitter node kind into the closed declaration set
///
/// Variable groups only match at the top level of the file; everything else
/// matches at any depth (methods inside classes, nested functions).
fn classify(language: ParsedLanguage, node_kind: &str, top_level: bool) -> Option<DeclKind> {
    use DeclKind::*;
    use ParsedLanguage::*;

    let kind = match (language, node_kind) {
        (Rust, "function_item") => Function,
        (Rust, "struct_item") => Class,
        (Rust, "impl_item") => Class,
        (Rust, "trait_item") => Interface,
        (Rust, "enum_item") => Enum,
        (Rust, "type_item") => TypeAlias,
        (Rust, "const_item" | "static_item") if top_level => VariableGroup,

        (Python, "function_definition") => Function,
        (Python, "decorated_definition") => Function,
        (Python, "class_definition") => Class,

        (JavaScript | TypeScript, "function_declaration") => Function,
        (JavaScript | TypeScript, "generator_function_declaration") => Function,
        (JavaScript | TypeScript, "class_declaration") => Class,
        (JavaScript | TypeScript, "method_definition") => Method,
        (JavaScript | TypeScript, "lexical_declaration" | "variable_declaration")
            if top_level =>
        {
            VariableGroup
        }
        (TypeScript, "interface_declaration") => Interface,
        (TypeScript, "enum_declaration") => Enum,
        (TypeScript, "type_alias_declaration") => TypeAlias,
        (TypeScript, "abstract_class_declaration") => Class,

        (Go, "function_declaration") => Function,
        (Go, "method_declaration") => Method,
        (Go, "type_declaration") => TypeAlias,
        (Go, "var_declaration" | "const_declaration") if top_level => VariableGroup,

        (Java, "class_declaration") => Class,
        (Java, "interface_declaration") => Interface,
        (Java, "enum_declaration") => Enum,
        (Java, "method_declaration") => Method,
        (Java, "constructor_declaration") => Constructor,

        (Swift, "function_declaration") => Function,
        (Swift, "class_declaration") => Class,
        (Swift, "protocol_declaration") => Interface,
        (Swift, "typealias_declaration") => TypeAlias,

        (C | Cpp, "function_definition") => Function,
        (C | Cpp, "struct_specifier" | "union_specifier") => Class,
        (C | Cpp, "enum_specifier") => Enum,
        (C | Cpp, "type_definition") => TypeAlias,
        (Cpp, "class_specifier") => Class,
        (Cpp, "alias_declaration") => TypeAlias,

        (CSharp, "class_declaration" | "struct_declaration" | "record_declaration") => Class,
        (CSharp, "interface_declaration") => Interface,
        (CSharp, "enum_declaration") => Enum,
        (CSharp, "method_declaration") => Method,
        (CSharp, "constructor_declaration") => Constructor,

        (Ruby, "method" | "singleton_method") => Method,
        (Ruby, "class" | "singleton_class") => Class,

        (Php, "function_definition") => Function,
        (Php, "method_declaration") => Method,
        (Php, "class_declaration") => Class,
        (Php, "interface_declaration") => Interface,
        (Php, "trait_declaration") => Class,
        (Php, "enum_declaration") => Enum,

        _ => return None,
    };

    Some(kind)
}

/// Methods named like a constructor are constructors
fn refine_constructor(
    language: ParsedLanguage,
    kind: DeclKind,
    symbol: Option<&str>,
) -> DeclKind {
    if kind != DeclKind::Method {
        return kind;
    }
    let is_ctor = match language {
        ParsedLanguage::JavaScript | ParsedLanguage::TypeScript => symbol == Some("constructor"),
        ParsedLanguage::Php => symbol == Some("__construct"),
        ParsedLanguage::Ruby => symbol == Some("initialize"),
        _ => false,
    };
    if is_ctor { DeclKind::Constructor } else { kind }
}

/// Derive the declared name(s) for a node, when the grammar exposes them
fn extract_symbol(language: ParsedLanguage, node: Node, source: &str) -> Option<String> {
    let text = |n: Node| -> Option<String> {
        n.utf8_text(source.as_bytes())
            .ok()
            .map(|s| s.trim().to_string())
    };

    // Multi-declarator statements: join every declared name
    let declarator_kinds: &[&str] = match (language, node.kind()) {
        (
            ParsedLanguage::JavaScript | ParsedLanguage::TypeScript,
            "lexical_declaration" | "variable_declaration",
        ) => &["variable_declarator"],
        (ParsedLanguage::Go, "var_declaration") => &["var_spec"],
        (ParsedLanguage::Go, "const_declaration") => &["const_spec"],
        _ => &[],
    };

    if !declarator_kinds.is_empty() {
        let mut names = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if !declarator_kinds.contains(&child.kind()) {
                continue;
            }
            let mut name_cursor = child.walk();
            for name in child.children_by_field_name("name", &mut name_cursor) {
                if let Some(t) = text(name) {
                    names.push(t);
                }
            }
        }
        return if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        };
    }

    // Python decorated definitions carry the name on the wrapped definition
    if node.kind() == "decorated_definition" {
        let inner = node.child_by_field_name("definition")?;
        return inner.child_by_field_name("name").and_then(text);
    }

    // Rust impl blocks are named by the type they implement
    if node.kind() == "impl_item" {
        return node.child_by_field_name("type").and_then(text);
    }

    // C/C++ function definitions bury the name in the declarator
    if node.kind() == "function_definition"
        && matches!(language, ParsedLanguage::C | ParsedLanguage::Cpp)
    {
        let mut current = node.child_by_field_name("declarator")?;
        loop {
            if let Some(inner) = current.child_by_field_name("declarator") {
                current = inner;
            } else {
                return text(current);
            }
        }
    }

    node.child_by_field_name("name").and_then(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(language: ParsedLanguage, source: &str) -> Vec<Declaration> {
        let mut parser = AstParser::new(language).unwrap();
        parser.declarations(source).unwrap()
    }

    #[test]
    fn test_rust_declarations() {
        let source = r#"
fn main() {
    println!("Hello, world!");
}

struct Config {
    level: u32,
}

impl Config {
    fn new() -> Self {
        Config { level: 0 }
    }
}
"#;

        let decls = parse(ParsedLanguage::Rust, source);
        assert!(decls.len() >= 3);
        assert!(decls.iter().any(|d| d.node_type == "function_item"));
        assert!(decls.iter().any(|d| d.node_type == "struct_item"));
        assert!(decls.iter().any(|d| d.node_type == "impl_item"));

        let main_fn = decls
            .iter()
            .find(|d| d.symbol.as_deref() == Some("main"))
            .unwrap();
        assert_eq!(main_fn.kind, DeclKind::Function);
        assert_eq!(main_fn.start_line, 2);
        assert_eq!(main_fn.end_line, 4);
    }

    #[test]
    fn test_typescript_function_and_class() {
        let source = r#"
export function greet(name: string): string {
    return `Hello, ${name}!`;
}

class Greeter {
    constructor(private name: string) {}

    greet(): string {
        return greet(this.name);
    }
}
"#;

        let decls = parse(ParsedLanguage::TypeScript, source);
        assert!(decls.iter().any(|d| d.kind == DeclKind::Function));
        assert!(decls.iter().any(|d| d.kind == DeclKind::Class));
        assert!(decls.iter().any(|d| d.kind == DeclKind::Constructor));
        assert!(
            decls
                .iter()
                .any(|d| d.kind == DeclKind::Method && d.symbol.as_deref() == Some("greet"))
        );
    }

    #[test]
    fn test_typescript_variable_group_symbols() {
        let source = "const alpha = 1, beta = 2;\n";
        let decls = parse(ParsedLanguage::TypeScript, source);

        let group = decls
            .iter()
            .find(|d| d.kind == DeclKind::VariableGroup)
            .unwrap();
        assert_eq!(group.node_type, "lexical_declaration");
        assert_eq!(group.symbol.as_deref(), Some("alpha, beta"));
    }

    #[test]
    fn test_nested_variables_are_not_groups() {
        let source = r#"
function outer() {
    const inner = 1;
    return inner;
}
"#;
        let decls = parse(ParsedLanguage::JavaScript, source);
        assert!(decls.iter().any(|d| d.kind == DeclKind::Function));
        assert!(!decls.iter().any(|d| d.kind == DeclKind::VariableGroup));
    }

    #[test]
    fn test_python_declarations() {
        let source = r#"
def hello():
    print("Hello")

class Greeter:
    def __init__(self):
        self.value = 0

    def greet(self):
        return self.value
"#;

        let decls = parse(ParsedLanguage::Python, source);
        assert!(decls.iter().any(|d| d.node_type == "function_definition"));
        assert!(decls.iter().any(|d| d.node_type == "class_definition"));
        let class = decls
            .iter()
            .find(|d| d.kind == DeclKind::Class)
            .unwrap();
        assert_eq!(class.symbol.as_deref(), Some("Greeter"));
    }

    #[test]
    fn test_go_declarations() {
        let source = r#"
package main

const answer = 42

func add(a, b int) int {
	return a + b
}

type point struct {
	x, y int
}
"#;

        let decls = parse(ParsedLanguage::Go, source);
        assert!(decls.iter().any(|d| d.kind == DeclKind::Function));
        assert!(decls.iter().any(|d| d.kind == DeclKind::TypeAlias));
        let group = decls
            .iter()
            .find(|d| d.kind == DeclKind::VariableGroup)
            .unwrap();
        assert_eq!(group.symbol.as_deref(), Some("answer"));
    }

    #[test]
    fn test_c_function_symbol() {
        let source = r#"
int add(int a, int b) {
    return a + b;
}
"#;
        let decls = parse(ParsedLanguage::C, source);
        let func = decls
            .iter()
            .find(|d| d.kind == DeclKind::Function)
            .unwrap();
        assert_eq!(func.symbol.as_deref(), Some("add"));
    }

    #[test]
    fn test_java_constructor() {
        let source = r#"
class Counter {
    private int value;

    Counter() {
        value = 0;
    }

    int get() {
        return value;
    }
}
"#;
        let decls = parse(ParsedLanguage::Java, source);
        assert!(decls.iter().any(|d| d.kind == DeclKind::Constructor));
        assert!(decls.iter().any(|d| d.kind == DeclKind::Method));
        assert!(decls.iter().any(|d| d.kind == DeclKind::Class));
    }

    #[test]
    fn test_ruby_initialize_is_constructor() {
        let source = r#"
class Greeter
  def initialize(name)
    @name = name
  end

  def greet
    @name
  end
end
"#;
        let decls = parse(ParsedLanguage::Ruby, source);
        assert!(decls.iter().any(|d| d.kind == DeclKind::Constructor));
        assert!(
            decls
                .iter()
                .any(|d| d.kind == DeclKind::Method && d.symbol.as_deref() == Some("greet"))
        );
    }

    #[test]
    fn test_file_with_no_declarations() {
        let decls = parse(ParsedLanguage::JavaScript, "import fs from 'fs';\nfs.readFileSync('x');\n");
        assert!(decls.is_empty());
    }

    #[test]
    fn test_is_function_like() {
        assert!(DeclKind::Function.is_function_like());
        assert!(DeclKind::Constructor.is_function_like());
        assert!(!DeclKind::Class.is_function_like());
    }
}
