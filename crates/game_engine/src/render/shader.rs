//! Shader sources, include preprocessing and validation
//!
//! Programs are kept as GLSL text. Before a backend sees a stage it goes
//! through [`ShaderLibrary::preprocess`], which expands `#include "name"`
//! directives from registered include sources and injects `#define`s right
//! after the `#version` line, and then through [`ShaderLibrary::validate`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::{Asset, AssetError};

/// Shader errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// No program registered under the name
    #[error("Shader program not found: {0}")]
    ProgramNotFound(String),

    /// `#include` names an unknown source
    #[error("Include '{name}' not found (included from '{from}')")]
    IncludeNotFound {
        /// Requested include
        name: String,
        /// Source containing the directive
        from: String,
    },

    /// Includes form a cycle
    #[error("Include cycle: {}", .0.join(" -> "))]
    IncludeCycle(Vec<String>),

    /// `#include` without a quoted name
    #[error("Malformed include directive in '{source_name}' line {line}")]
    MalformedInclude {
        /// Source containing the directive
        source_name: String,
        /// 1-based line number
        line: usize,
    },

    /// No `#version` directive
    #[error("{0:?} stage has no #version directive")]
    MissingVersion(ShaderStage),

    /// No `void main` entry point
    #[error("{0:?} stage has no 'void main' entry point")]
    MissingEntryPoint(ShaderStage),

    /// `{` and `}` do not pair up
    #[error("{stage:?} stage has unbalanced braces at line {line}")]
    UnbalancedBraces {
        /// Stage being validated
        stage: ShaderStage,
        /// Line where the imbalance was detected
        line: usize,
    },
}

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
}

impl ShaderStage {
    /// Stage implied by a file extension (`vert` / `frag`)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "vert" | "vs" => Some(Self::Vertex),
            "frag" | "fs" => Some(Self::Fragment),
            _ => None,
        }
    }
}

/// GLSL source text loaded from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource(pub String);

impl Asset for ShaderSource {
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        String::from_utf8(bytes.to_vec())
            .map(ShaderSource)
            .map_err(|e| AssetError::InvalidData(format!("shader is not UTF-8: {e}")))
    }

    fn extensions() -> &'static [&'static str] {
        &["glsl", "vert", "frag", "vs", "fs"]
    }
}

/// Opaque id assigned by the library in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ShaderId(pub u32);

/// Vertex + fragment program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    /// Program name, referenced by materials
    pub name: String,
    /// Vertex stage source
    pub vertex: String,
    /// Fragment stage source
    pub fragment: String,
    /// Defines injected into both stages (`NAME` -> value, empty for flags)
    pub defines: BTreeMap<String, String>,
}

impl ShaderProgram {
    /// Create a program without defines
    pub fn new(name: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertex: vertex.into(),
            fragment: fragment.into(),
            defines: BTreeMap::new(),
        }
    }

    /// Add a define
    pub fn with_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.insert(name.into(), value.into());
        self
    }

    fn stage(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }
}

/// Preprocessed, validated program ready for a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledProgram {
    /// Library id
    pub id: ShaderId,
    /// Program name
    pub name: String,
    /// Final vertex source
    pub vertex: String,
    /// Final fragment source
    pub fragment: String,
}

const COMMON_GLSL: &str = r"const int MAX_DIRECTIONAL_LIGHTS = 4;
const int MAX_POINT_LIGHTS = 8;
const int MAX_SPOT_LIGHTS = 4;

layout(set = 0, binding = 0) uniform Frame {
    mat4 view;
    mat4 projection;
    mat4 view_projection;
    vec4 camera_position;
} frame;
";

const STANDARD_VERT: &str = r#"#version 450
#include "common"

layout(location = 0) in vec3 in_position;
layout(location = 1) in vec3 in_normal;
layout(location = 2) in vec2 in_tex_coord;
layout(location = 3) in mat4 in_model;

layout(location = 0) out vec3 world_position;
layout(location = 1) out vec3 world_normal;
layout(location = 2) out vec2 tex_coord;

void main() {
    vec4 world = in_model * vec4(in_position, 1.0);
    world_position = world.xyz;
    world_normal = mat3(in_model) * in_normal;
    tex_coord = in_tex_coord;
    gl_Position = frame.view_projection * world;
}
"#;

const STANDARD_FRAG: &str = r#"#version 450
#include "common"

layout(location = 0) in vec3 world_position;
layout(location = 1) in vec3 world_normal;
layout(location = 2) in vec2 tex_coord;

layout(location = 0) out vec4 out_color;

layout(push_constant) uniform MaterialData {
    vec4 base_color;
    vec4 emissive;
} material;

void main() {
#ifdef UNLIT
    out_color = material.base_color;
#else
    float light = max(dot(normalize(world_normal), vec3(0.0, 1.0, 0.0)), 0.1);
    out_color = vec4(material.base_color.rgb * light + material.emissive.rgb, material.base_color.a);
#endif
}
"#;

/// Registry of shader programs and include sources
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    programs: Vec<ShaderProgram>,
    by_name: HashMap<String, ShaderId>,
    includes: HashMap<String, String>,
}

impl ShaderLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Library with the `standard` (lit) and `unlit` programs and the
    /// `common` include
    pub fn with_builtins() -> Self {
        let mut library = Self::new();
        library.register_include("common", COMMON_GLSL);
        library.register(ShaderProgram::new("standard", STANDARD_VERT, STANDARD_FRAG));
        library.register(ShaderProgram::new("unlit", STANDARD_VERT, STANDARD_FRAG).with_define("UNLIT", ""));
        library
    }

    /// Register a program; a program with the same name is replaced and keeps its id
    pub fn register(&mut self, program: ShaderProgram) -> ShaderId {
        if let Some(&id) = self.by_name.get(&program.name) {
            log::debug!("Replacing shader program '{}'", program.name);
            self.programs[id.0 as usize] = program;
            return id;
        }
        let id = ShaderId(self.programs.len() as u32);
        self.by_name.insert(program.name.clone(), id);
        self.programs.push(program);
        id
    }

    /// Register source text available to `#include`
    pub fn register_include(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.includes.insert(name.into(), source.into());
    }

    /// Get a program by name
    pub fn get(&self, name: &str) -> Option<&ShaderProgram> {
        self.id(name).and_then(|id| self.get_by_id(id))
    }

    /// Get a program by id
    pub fn get_by_id(&self, id: ShaderId) -> Option<&ShaderProgram> {
        self.programs.get(id.0 as usize)
    }

    /// Id of a program
    pub fn id(&self, name: &str) -> Option<ShaderId> {
        self.by_name.get(name).copied()
    }

    /// Number of programs
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Whether no program is registered
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Iterate `(id, program)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (ShaderId, &ShaderProgram)> {
        self.programs.iter().enumerate().map(|(i, p)| (ShaderId(i as u32), p))
    }

    /// Expand includes and inject defines
    pub fn preprocess(&self, source_name: &str, source: &str, defines: &BTreeMap<String, String>) -> Result<String, ShaderError> {
        // Only includes go on the stack; the top-level source is not an include
        let mut stack = Vec::new();
        let expanded = self.expand_includes(source_name, source, &mut stack)?;
        Ok(inject_defines(&expanded, defines))
    }

    fn expand_includes(&self, source_name: &str, source: &str, stack: &mut Vec<String>) -> Result<String, ShaderError> {
        let mut output = String::with_capacity(source.len());
        for (index, line) in source.lines().enumerate() {
            let trimmed = line.trim_start();
            let Some(rest) = trimmed.strip_prefix("#include") else {
                output.push_str(line);
                output.push('\n');
                continue;
            };

            let name = parse_include_name(rest).ok_or_else(|| ShaderError::MalformedInclude {
                source_name: source_name.to_string(),
                line: index + 1,
            })?;
            if stack.iter().any(|open| open == name) {
                let mut cycle = stack.clone();
                cycle.push(name.to_string());
                return Err(ShaderError::IncludeCycle(cycle));
            }
            let included = self.includes.get(name).ok_or_else(|| ShaderError::IncludeNotFound {
                name: name.to_string(),
                from: source_name.to_string(),
            })?;

            stack.push(name.to_string());
            output.push_str(&self.expand_includes(name, included, stack)?);
            stack.pop();
        }
        Ok(output)
    }

    /// Structural checks on a preprocessed stage
    pub fn validate(stage: ShaderStage, source: &str) -> Result<(), ShaderError> {
        if !source.lines().any(|l| l.trim_start().starts_with("#version")) {
            return Err(ShaderError::MissingVersion(stage));
        }

        let mut depth: i64 = 0;
        let mut has_main = false;
        for (index, line) in source.lines().enumerate() {
            let code = line.split("//").next().unwrap_or("");
            if code.split_whitespace().collect::<Vec<_>>().windows(2).any(|w| {
                w[0] == "void" && (w[1] == "main" || w[1].starts_with("main("))
            }) {
                has_main = true;
            }
            for c in code.chars() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth < 0 {
                            return Err(ShaderError::UnbalancedBraces { stage, line: index + 1 });
                        }
                    }
                    _ => {}
                }
            }
        }
        if depth != 0 {
            return Err(ShaderError::UnbalancedBraces {
                stage,
                line: source.lines().count(),
            });
        }
        if !has_main {
            return Err(ShaderError::MissingEntryPoint(stage));
        }
        Ok(())
    }

    /// Preprocess and validate both stages of a program
    pub fn compile(&self, name: &str) -> Result<CompiledProgram, ShaderError> {
        let id = self.id(name).ok_or_else(|| ShaderError::ProgramNotFound(name.to_string()))?;
        let program = &self.programs[id.0 as usize];

        let build = |stage: ShaderStage| -> Result<String, ShaderError> {
            let source = self.preprocess(&program.name, program.stage(stage), &program.defines)?;
            Self::validate(stage, &source)?;
            Ok(source)
        };
        let vertex = build(ShaderStage::Vertex)?;
        let fragment = build(ShaderStage::Fragment)?;

        Ok(CompiledProgram {
            id,
            name: program.name.clone(),
            vertex,
            fragment,
        })
    }
}

fn parse_include_name(rest: &str) -> Option<&str> {
    let rest = rest.trim();
    let (open, close) = match rest.chars().next()? {
        '"' => ('"', '"'),
        '<' => ('<', '>'),
        _ => return None,
    };
    let inner = rest.strip_prefix(open)?;
    let end = inner.find(close)?;
    let name = &inner[..end];
    (!name.is_empty()).then_some(name)
}

fn inject_defines(source: &str, defines: &BTreeMap<String, String>) -> String {
    if defines.is_empty() {
        return source.to_string();
    }
    let block: String = defines
        .iter()
        .map(|(name, value)| {
            if value.is_empty() {
                format!("#define {name}\n")
            } else {
                format!("#define {name} {value}\n")
            }
        })
        .collect();

    // #version must stay the first statement
    let mut output = String::with_capacity(source.len() + block.len());
    let mut injected = false;
    for line in source.lines() {
        output.push_str(line);
        output.push('\n');
        if !injected && line.trim_start().starts_with("#version") {
            output.push_str(&block);
            injected = true;
        }
    }
    if !injected {
        output.insert_str(0, &block);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_compile() {
        let library = ShaderLibrary::with_builtins();
        let standard = library.compile("standard").unwrap();
        assert!(standard.vertex.contains("uniform Frame"));
        assert!(!standard.vertex.contains("#include"));

        let unlit = library.compile("unlit").unwrap();
        let mut lines = unlit.fragment.lines();
        assert_eq!(lines.next(), Some("#version 450"));
        assert_eq!(lines.next(), Some("#define UNLIT"));
        assert_ne!(standard.id, unlit.id);
    }

    #[test]
    fn test_nested_includes_expand() {
        let mut library = ShaderLibrary::new();
        library.register_include("a", "#include \"b\"\nfloat a;");
        library.register_include("b", "float b;");
        let out = library.preprocess("main", "#version 450\n#include <a>\n", &BTreeMap::new()).unwrap();
        assert_eq!(out, "#version 450\nfloat b;\nfloat a;\n");
    }

    #[test]
    fn test_include_cycle_is_detected() {
        let mut library = ShaderLibrary::new();
        library.register_include("a", "#include \"b\"");
        library.register_include("b", "#include \"a\"");
        let err = library.preprocess("main", "#include \"a\"", &BTreeMap::new()).unwrap_err();
        assert_eq!(
            err,
            ShaderError::IncludeCycle(vec!["a".into(), "b".into(), "a".into()])
        );
    }

    #[test]
    fn test_include_named_like_program_is_not_a_cycle() {
        let mut library = ShaderLibrary::new();
        library.register_include("lighting", "float light;");
        let out = library
            .preprocess("lighting", "#version 450\n#include \"lighting\"\n", &BTreeMap::new())
            .unwrap();
        assert_eq!(out, "#version 450\nfloat light;\n");

        library.register_include("self", "#include \"self\"");
        assert_eq!(
            library.preprocess("main", "#include \"self\"", &BTreeMap::new()),
            Err(ShaderError::IncludeCycle(vec!["self".into(), "self".into()]))
        );
    }

    #[test]
    fn test_missing_and_malformed_includes() {
        let library = ShaderLibrary::new();
        assert!(matches!(
            library.preprocess("main", "#include \"nope\"", &BTreeMap::new()),
            Err(ShaderError::IncludeNotFound { .. })
        ));
        assert_eq!(
            library.preprocess("main", "\n#include nope", &BTreeMap::new()),
            Err(ShaderError::MalformedInclude {
                source_name: "main".into(),
                line: 2
            })
        );
    }

    #[test]
    fn test_defines_without_version_go_first() {
        let mut defines = BTreeMap::new();
        defines.insert("COUNT".to_string(), "3".to_string());
        let out = ShaderLibrary::new().preprocess("x", "void main() {}", &defines).unwrap();
        assert_eq!(out, "#define COUNT 3\nvoid main() {}\n");
    }

    #[test]
    fn test_validate() {
        let ok = "#version 450\nvoid main() {\n}\n";
        assert_eq!(ShaderLibrary::validate(ShaderStage::Vertex, ok), Ok(()));
        assert_eq!(
            ShaderLibrary::validate(ShaderStage::Vertex, "void main() {}"),
            Err(ShaderError::MissingVersion(ShaderStage::Vertex))
        );
        assert_eq!(
            ShaderLibrary::validate(ShaderStage::Fragment, "#version 450\nvoid helper() {}"),
            Err(ShaderError::MissingEntryPoint(ShaderStage::Fragment))
        );
        assert_eq!(
            ShaderLibrary::validate(ShaderStage::Fragment, "#version 450\nvoid main() {\n"),
            Err(ShaderError::UnbalancedBraces {
                stage: ShaderStage::Fragment,
                line: 2
            })
        );
        assert_eq!(
            ShaderLibrary::validate(ShaderStage::Fragment, "#version 450\n}\nvoid main() {}"),
            Err(ShaderError::UnbalancedBraces {
                stage: ShaderStage::Fragment,
                line: 2
            })
        );
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut library = ShaderLibrary::new();
        let first = library.register(ShaderProgram::new("p", "a", "b"));
        let second = library.register(ShaderProgram::new("p", "c", "d"));
        assert_eq!(first, second);
        assert_eq!(library.len(), 1);
        assert_eq!(library.get("p").unwrap().vertex, "c");
        assert!(matches!(library.compile("q"), Err(ShaderError::ProgramNotFound(_))));
        assert_eq!(ShaderStage::from_extension("FRAG"), Some(ShaderStage::Fragment));
    }
}
