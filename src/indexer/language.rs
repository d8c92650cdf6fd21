//! Programming language detection from file extensions

/// Languages with a tree-sitter grammar available for structural chunking
///
/// Everything outside this set is chunked with the windowed fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParsedLanguage {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    Swift,
    C,
    Cpp,
    CSharp,
    Ruby,
    Php,
}

impl ParsedLanguage {
    /// Resolve a file extension to a parseable language
    pub fn from_extension(extension: &str) -> Option<Self> {
        let lang = match extension.to_lowercase().as_str() {
            "rs" => Self::Rust,
            "py" => Self::Python,
            "js" | "mjs" | "cjs" | "jsx" => Self::JavaScript,
            "ts" | "tsx" => Self::TypeScript,
            "go" => Self::Go,
            "java" => Self::Java,
            "swift" => Self::Swift,
            "c" => Self::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" | "h" => Self::Cpp,
            "cs" => Self::CSharp,
            "rb" => Self::Ruby,
            "php" => Self::Php,
            _ => return None,
        };
        Some(lang)
    }

    /// The tree-sitter grammar for this language
    pub fn grammar(&self) -> tree_sitter::Language {
        match self {
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Go => tree_sitter_go::LANGUAGE.into(),
            Self::Java => tree_sitter_java::LANGUAGE.into(),
            Self::Swift => tree_sitter_swift::LANGUAGE.into(),
            Self::C => tree_sitter_c::LANGUAGE.into(),
            Self::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            Self::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
            Self::Ruby => tree_sitter_ruby::LANGUAGE.into(),
            Self::Php => tree_sitter_php::LANGUAGE_PHP.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rust => "Rust",
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Go => "Go",
            Self::Java => "Java",
            Self::Swift => "Swift",
            Self::C => "C",
            Self::Cpp => "C++",
            Self::CSharp => "C#",
            Self::Ruby => "Ruby",
            Self::Php => "PHP",
        }
    }
}

/// Detect a display language tag from a file extension
///
/// Broader than [`ParsedLanguage`]: covers data formats and documentation so
/// search results can label every indexed file.
pub fn detect_language(extension: &str) -> Option<String> {
    if let Some(parsed) = ParsedLanguage::from_extension(extension) {
        return Some(parsed.name().to_string());
    }

    let lang = match extension.to_lowercase().as_str() {
        "kt" | "kts" => "Kotlin",
        "scala" => "Scala",
        "sh" | "bash" => "Shell",
        "sql" => "SQL",
        "html" | "htm" => "HTML",
        "css" => "CSS",
        "scss" | "sass" => "SCSS",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "toml" => "TOML",
        "xml" => "XML",
        "ini" => "INI",
        "conf" | "config" | "cfg" => "Config",
        "properties" => "Properties",
        "env" => "Environment",
        "md" | "markdown" => "Markdown",
        "rst" => "reStructuredText",
        "adoc" | "asciidoc" => "AsciiDoc",
        "org" => "Org Mode",
        "txt" => "Text",
        "log" => "Log",
        _ => return None,
    };

    Some(lang.to_string())
}
