//! OBJ file loader for 3D models
//!
//! Supports `v`, `vt`, `vn` and `f` records with all four vertex reference
//! forms (`v`, `v/vt`, `v//vn`, `v/vt/vn`), negative (relative) indices and
//! polygons, which are fan-triangulated. `o`/`g` and `usemtl` split the index
//! buffer into groups; `mtllib` names are recorded. Vertices that share the
//! same position/uv/normal triple are emitted once.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::render::{Mesh, Vertex};

/// OBJ parse errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be parsed
    #[error("Line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Structurally invalid file
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Index range drawn with one material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjGroup {
    /// Object or group name (`o` / `g`), empty if none was given
    pub name: String,
    /// Material selected by `usemtl`
    pub material: Option<String>,
    /// First index in the mesh index buffer
    pub first_index: u32,
    /// Number of indices
    pub index_count: u32,
}

/// Parsed OBJ file
#[derive(Debug, Clone)]
pub struct ObjModel {
    /// Combined mesh of every face
    pub mesh: Mesh,
    /// Material libraries referenced by `mtllib`
    pub material_libraries: Vec<String>,
    /// Non-empty groups in file order
    pub groups: Vec<ObjGroup>,
}

/// (position, uv, normal) indices, 0-based
type VertexKey = (usize, Option<usize>, Option<usize>);

#[derive(Default)]
struct ObjBuilder {
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    vertices: Vec<Vertex>,
    missing_normal: Vec<bool>,
    indices: Vec<u32>,
    dedup: HashMap<VertexKey, u32>,
    groups: Vec<ObjGroup>,
    material_libraries: Vec<String>,
}

impl ObjBuilder {
    fn current_group(&mut self) -> &mut ObjGroup {
        if self.groups.is_empty() {
            self.groups.push(ObjGroup {
                name: String::new(),
                material: None,
                first_index: 0,
                index_count: 0,
            });
        }
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    /// Start a new group unless the current one is still empty
    fn begin_group(&mut self, name: Option<String>, material: Option<Option<String>>) {
        let first_index = self.indices.len() as u32;
        let current = self.current_group();
        if current.index_count == 0 {
            if let Some(name) = name {
                current.name = name;
            }
            if let Some(material) = material {
                current.material = material;
            }
            return;
        }
        let next = ObjGroup {
            name: name.unwrap_or_else(|| current.name.clone()),
            material: material.unwrap_or_else(|| current.material.clone()),
            first_index,
            index_count: 0,
        };
        self.groups.push(next);
    }

    fn vertex(&mut self, reference: &str, line: usize) -> Result<u32, ObjError> {
        let mut parts = reference.split('/');
        let position = resolve_index(parts.next(), self.positions.len(), line, "position")?
            .ok_or_else(|| parse_error(line, "face vertex is missing a position index"))?;
        let tex = resolve_index(parts.next(), self.tex_coords.len(), line, "texture coordinate")?;
        let normal = resolve_index(parts.next(), self.normals.len(), line, "normal")?;

        let key = (position, tex, normal);
        if let Some(&index) = self.dedup.get(&key) {
            return Ok(index);
        }

        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex::new(
            self.positions[position],
            normal.map_or([0.0, 0.0, 0.0], |n| self.normals[n]),
            tex.map_or([0.0, 0.0], |t| self.tex_coords[t]),
        ));
        self.missing_normal.push(normal.is_none());
        self.dedup.insert(key, index);
        Ok(index)
    }

    fn face(&mut self, references: &[&str], line: usize) -> Result<(), ObjError> {
        if references.len() < 3 {
            return Err(ObjError::InvalidFormat(format!(
                "line {line}: face needs at least 3 vertices, got {}",
                references.len()
            )));
        }
        let corners = references
            .iter()
            .map(|r| self.vertex(r, line))
            .collect::<Result<Vec<u32>, ObjError>>()?;

        let mut added = 0;
        for i in 1..corners.len() - 1 {
            self.indices.extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
            added += 3;
        }
        self.current_group().index_count += added;
        Ok(())
    }

    /// Smooth normals from face normals for vertices the file gave none
    fn fill_missing_normals(&mut self) {
        if !self.missing_normal.iter().any(|m| *m) {
            return;
        }
        let mut accumulated = vec![Vec3::zeros(); self.vertices.len()];
        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            let pa = Vec3::from(self.vertices[a].position);
            let pb = Vec3::from(self.vertices[b].position);
            let pc = Vec3::from(self.vertices[c].position);
            let face_normal = (pb - pa).cross(&(pc - pa));
            for index in [a, b, c] {
                accumulated[index] += face_normal;
            }
        }
        for (i, vertex) in self.vertices.iter_mut().enumerate() {
            if self.missing_normal[i] {
                let normal = accumulated[i].try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y);
                vertex.normal = normal.into();
            }
        }
    }

    fn finish(mut self) -> Result<ObjModel, ObjError> {
        if self.indices.is_empty() {
            return Err(ObjError::InvalidFormat("No faces found in OBJ data".to_string()));
        }
        self.fill_missing_normals();
        self.groups.retain(|g| g.index_count > 0);
        Ok(ObjModel {
            mesh: Mesh::new(self.vertices, self.indices),
            material_libraries: self.material_libraries,
            groups: self.groups,
        })
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> ObjError {
    ObjError::ParseError {
        line,
        message: message.into(),
    }
}

/// Turn a 1-based or negative OBJ index into a 0-based one
fn resolve_index(field: Option<&str>, count: usize, line: usize, what: &str) -> Result<Option<usize>, ObjError> {
    let Some(field) = field.filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    let raw: i64 = field
        .parse()
        .map_err(|_| parse_error(line, format!("invalid {what} index '{field}'")))?;
    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r as usize - 1),
        r => (count as i64 + r).try_into().ok(),
    };
    match resolved {
        Some(index) if index < count => Ok(Some(index)),
        _ => Err(ObjError::InvalidFormat(format!(
            "line {line}: {what} index {raw} out of range (have {count})"
        ))),
    }
}

fn parse_floats<const N: usize>(parts: &[&str], line: usize, what: &str) -> Result<[f32; N], ObjError> {
    if parts.len() < N {
        return Err(parse_error(line, format!("{what} needs {N} components")));
    }
    let mut values = [0.0; N];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part
            .parse()
            .map_err(|_| parse_error(line, format!("invalid {what} component '{part}'")))?;
    }
    Ok(values)
}

/// OBJ loader
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file and return its mesh
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text)?.mesh)
    }

    /// Parse OBJ text
    pub fn parse(text: &str) -> Result<ObjModel, ObjError> {
        let mut builder = ObjBuilder::default();

        for (number, raw_line) in text.lines().enumerate() {
            let line = number + 1;
            let content = raw_line.split('#').next().unwrap_or("").trim();
            let parts: Vec<&str> = content.split_whitespace().collect();
            let Some((&keyword, rest)) = parts.split_first() else {
                continue;
            };

            match keyword {
                "v" => builder.positions.push(parse_floats::<3>(rest, line, "vertex")?),
                "vt" => builder.tex_coords.push(parse_floats::<2>(rest, line, "texture coordinate")?),
                "vn" => builder.normals.push(parse_floats::<3>(rest, line, "normal")?),
                "f" => builder.face(rest, line)?,
                "o" | "g" => builder.begin_group(Some(rest.join(" ")), None),
                "usemtl" => builder.begin_group(None, Some(rest.first().map(|m| (*m).to_string()))),
                "mtllib" => builder
                    .material_libraries
                    .extend(rest.iter().map(|lib| (*lib).to_string())),
                _ => log::trace!("Ignoring OBJ record '{keyword}' on line {line}"),
            }
        }

        builder.finish()
    }
}
