//! Wavefront MTL parser
//!
//! Reads the Phong subset used by exported scenes: `newmtl`, `Ka`, `Kd`,
//! `Ks`, `Ke`, `Ns`, `d`, `Tr` and `map_Kd`. Statements before the first
//! `newmtl` have no material to apply to and are skipped.

use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::render::{Material, MaterialFlags};

/// MTL parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MtlError {
    /// A statement is missing its value
    #[error("Line {line}: {statement} missing value")]
    MissingValue {
        /// 1-based line number
        line: usize,
        /// Statement keyword
        statement: String,
    },

    /// A value is not a number
    #[error("Line {line}: {statement} has invalid value '{value}'")]
    InvalidValue {
        /// 1-based line number
        line: usize,
        /// Statement keyword
        statement: String,
        /// Offending token
        value: String,
    },
}

/// One parsed `newmtl` block
#[derive(Debug, Clone, PartialEq)]
pub struct MtlData {
    /// Material name
    pub name: String,
    /// Ambient color (Ka)
    pub ambient: Vec3,
    /// Diffuse color (Kd)
    pub diffuse: Vec3,
    /// Specular color (Ks)
    pub specular: Vec3,
    /// Emission color (Ke)
    pub emission: Vec3,
    /// Specular exponent (Ns)
    pub specular_exponent: f32,
    /// Dissolve (d), 1.0 = opaque
    pub dissolve: f32,
    /// Diffuse texture map (map_Kd)
    pub diffuse_map: Option<String>,
}

impl Default for MtlData {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: Vec3::new(1.0, 1.0, 1.0),
            diffuse: Vec3::new(0.8, 0.8, 0.8),
            specular: Vec3::new(0.5, 0.5, 0.5),
            emission: Vec3::zeros(),
            specular_exponent: 32.0,
            dissolve: 1.0,
            diffuse_map: None,
        }
    }
}

impl MtlData {
    /// Build an engine material from the parsed values
    pub fn to_material(&self) -> Material {
        let mut material = Material::new(self.name.clone())
            .with_color(self.diffuse.x, self.diffuse.y, self.diffuse.z)
            .with_opacity(self.dissolve);
        material.specular = self.specular.into();
        material.shininess = self.specular_exponent;
        material.emissive = self.emission.into();
        material.diffuse_texture_path = self.diffuse_map.clone();
        if self.emission.max() > 0.0 && self.diffuse.max() == 0.0 {
            material.flags |= MaterialFlags::UNLIT;
        }
        material
    }
}

/// MTL file parser
pub struct MtlParser;

impl MtlParser {
    /// Parse MTL text into materials in file order
    pub fn parse(contents: &str) -> Result<Vec<MtlData>, MtlError> {
        let mut materials = Vec::new();
        let mut current: Option<MtlData> = None;

        for (index, raw_line) in contents.lines().enumerate() {
            let line = index + 1;
            let text = raw_line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let mut tokens = text.split_whitespace();
            let Some(statement) = tokens.next() else {
                continue;
            };

            if statement == "newmtl" {
                if let Some(done) = current.take() {
                    materials.push(done);
                }
                let name: Vec<&str> = tokens.collect();
                if name.is_empty() {
                    return Err(missing(line, statement));
                }
                current = Some(MtlData {
                    name: name.join(" "),
                    ..MtlData::default()
                });
                continue;
            }

            let Some(material) = current.as_mut() else {
                log::trace!("Skipping MTL statement '{statement}' outside a material on line {line}");
                continue;
            };

            match statement {
                "Ka" => material.ambient = parse_color(&mut tokens, line, statement)?,
                "Kd" => material.diffuse = parse_color(&mut tokens, line, statement)?,
                "Ks" => material.specular = parse_color(&mut tokens, line, statement)?,
                "Ke" => material.emission = parse_color(&mut tokens, line, statement)?,
                "Ns" => material.specular_exponent = parse_f32(&mut tokens, line, statement)?,
                "d" => material.dissolve = parse_f32(&mut tokens, line, statement)?.clamp(0.0, 1.0),
                // Tr is inverted dissolve
                "Tr" => material.dissolve = (1.0 - parse_f32(&mut tokens, line, statement)?).clamp(0.0, 1.0),
                "map_Kd" => {
                    let path: Vec<&str> = tokens.collect();
                    if path.is_empty() {
                        return Err(missing(line, statement));
                    }
                    material.diffuse_map = Some(path.join(" "));
                }
                _ => {}
            }
        }

        if let Some(done) = current {
            materials.push(done);
        }
        Ok(materials)
    }
}

fn missing(line: usize, statement: &str) -> MtlError {
    MtlError::MissingValue {
        line,
        statement: statement.to_string(),
    }
}

fn parse_f32<'a>(tokens: &mut impl Iterator<Item = &'a str>, line: usize, statement: &str) -> Result<f32, MtlError> {
    let token = tokens.next().ok_or_else(|| missing(line, statement))?;
    token.parse().map_err(|_| MtlError::InvalidValue {
        line,
        statement: statement.to_string(),
        value: token.to_string(),
    })
}

fn parse_color<'a>(tokens: &mut impl Iterator<Item = &'a str>, line: usize, statement: &str) -> Result<Vec3, MtlError> {
    let r = parse_f32(tokens, line, statement)?;
    let g = parse_f32(tokens, line, statement)?;
    let b = parse_f32(tokens, line, statement)?;
    Ok(Vec3::new(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
# exported materials
Kd 0 0 0
newmtl brick
Ka 0.1 0.1 0.1
Kd 0.7 0.3 0.2
Ks 0.2 0.2 0.2
Ns 64
map_Kd textures/brick wall.png

newmtl glass
Kd 0.9 0.9 1.0
Tr 0.75
";

    #[test]
    fn test_parses_materials_in_order() {
        let materials = MtlParser::parse(SAMPLE).unwrap();
        assert_eq!(materials.len(), 2);
        assert_eq!(materials[0].name, "brick");
        assert_eq!(materials[1].name, "glass");

        let brick = &materials[0];
        assert_relative_eq!(brick.diffuse, Vec3::new(0.7, 0.3, 0.2));
        assert_eq!(brick.specular_exponent, 64.0);
        assert_eq!(brick.diffuse_map.as_deref(), Some("textures/brick wall.png"));
        assert_relative_eq!(materials[1].dissolve, 0.25);
    }

    #[test]
    fn test_to_material() {
        let materials = MtlParser::parse(SAMPLE).unwrap();
        let brick = materials[0].to_material();
        assert_eq!(brick.name, "brick");
        assert_relative_eq!(brick.base_color[0], 0.7);
        assert_eq!(brick.shininess, 64.0);
        assert!(!brick.is_transparent());

        let glass = materials[1].to_material();
        assert!(glass.is_transparent());
    }

    #[test]
    fn test_bad_values_are_reported_with_line() {
        let err = MtlParser::parse("newmtl a\nKd 1 x 0\n").unwrap_err();
        assert_eq!(
            err,
            MtlError::InvalidValue {
                line: 2,
                statement: "Kd".to_string(),
                value: "x".to_string(),
            }
        );
        assert!(matches!(
            MtlParser::parse("newmtl a\nNs\n"),
            Err(MtlError::MissingValue { line: 2, .. })
        ));
    }
}
