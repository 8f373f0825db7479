//! `TypeDenoter`: the structural type representation shared (by reference
//! count) across expression nodes, per `spec.md` §3.

use std::rc::Rc;

use crate::ast::nodes::{DeclId};

/// Scalar base types. Ordering here doubles as the implicit-conversion
/// promotion rank used by `semantic::types` (lower rank converts to higher
/// at no cost beyond "promotion").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BaseType {
    Bool,
    Int,
    Uint,
    Half,
    Float,
    Double,
}

impl BaseType {
    pub fn name(self) -> &'static str {
        match self {
            BaseType::Bool => "bool",
            BaseType::Int => "int",
            BaseType::Uint => "uint",
            BaseType::Half => "half",
            BaseType::Float => "float",
            BaseType::Double => "double",
        }
    }

    pub fn from_name(name: &str) -> Option<BaseType> {
        Some(match name {
            "bool" => BaseType::Bool,
            "int" => BaseType::Int,
            "uint" | "dword" => BaseType::Uint,
            "half" => BaseType::Half,
            "float" => BaseType::Float,
            "double" => BaseType::Double,
            _ => return None,
        })
    }
}

/// Recognizes a builtin scalar/vector/matrix type spelled as a single
/// identifier (`float4`, `int2`, `float4x4`, ...). Bare scalar names
/// (`float`) lex as keywords rather than identifiers and are handled
/// separately by the parser; this covers only the suffixed forms, per
/// `spec.md` §4.2's "numeric suffix" note extended to type-name suffixes.
pub fn parse_vector_matrix_type_name(name: &str) -> Option<TypeDenoter> {
    for base in [
        BaseType::Bool,
        BaseType::Int,
        BaseType::Uint,
        BaseType::Half,
        BaseType::Float,
        BaseType::Double,
    ] {
        let prefix = base.name();
        if let Some(rest) = name.strip_prefix(prefix) {
            if rest.is_empty() {
                continue; // bare scalar name: not this function's concern
            }
            let mut chars = rest.chars();
            let rows: u8 = match chars.next()?.to_digit(10)? as u8 {
                n @ 1..=4 => n,
                _ => return None,
            };
            match chars.next() {
                None => return Some(TypeDenoter::Vector(base, rows)),
                Some('x') => {
                    let cols: u8 = match chars.next()?.to_digit(10)? as u8 {
                        n @ 1..=4 => n,
                        _ => return None,
                    };
                    if chars.next().is_some() {
                        return None;
                    }
                    return Some(TypeDenoter::Matrix(base, rows, cols));
                }
                _ => return None,
            }
        }
    }
    None
}

/// The dimensionality of a buffer/texture-like object type, used only to
/// select a generator-specific keyword; the cross-compiler does not model
/// sampling behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Buffer,
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
    Texture2DArray,
    RWBuffer,
    RWTexture1D,
    RWTexture2D,
    RWTexture3D,
    StructuredBuffer,
    RWStructuredBuffer,
    AppendStructuredBuffer,
    ConsumeStructuredBuffer,
    ConstantBuffer,
}

impl BufferKind {
    /// True for the object types that take a `<Element>` generic argument
    /// (`spec.md` §4.4 "generic brackets"); `ConstantBuffer` and `Buffer`-
    /// family types always do, but plain `Texture*` without a template
    /// argument defaults its element type to `float4` in HLSL.
    pub fn takes_generic_argument(self) -> bool {
        !matches!(self, BufferKind::Buffer)
    }

    /// Recognizes a builtin buffer/texture type name. These are not lexer
    /// keywords (`spec.md` §4.2's note that "Texture2D, ..." are ordinary
    /// identifiers) since a dialect's type names are closed over a fixed
    /// set the parser consults directly, distinct from the open-ended
    /// "known type names" set populated from user `struct`/`typedef`.
    pub fn from_name(name: &str) -> Option<BufferKind> {
        Some(match name {
            "Buffer" => BufferKind::Buffer,
            "Texture1D" => BufferKind::Texture1D,
            "Texture2D" => BufferKind::Texture2D,
            "Texture3D" => BufferKind::Texture3D,
            "TextureCube" => BufferKind::TextureCube,
            "Texture2DArray" => BufferKind::Texture2DArray,
            "RWBuffer" => BufferKind::RWBuffer,
            "RWTexture1D" => BufferKind::RWTexture1D,
            "RWTexture2D" => BufferKind::RWTexture2D,
            "RWTexture3D" => BufferKind::RWTexture3D,
            "StructuredBuffer" => BufferKind::StructuredBuffer,
            "RWStructuredBuffer" => BufferKind::RWStructuredBuffer,
            "AppendStructuredBuffer" => BufferKind::AppendStructuredBuffer,
            "ConsumeStructuredBuffer" => BufferKind::ConsumeStructuredBuffer,
            "ConstantBuffer" => BufferKind::ConstantBuffer,
            _ => return None,
        })
    }
}

/// Sampler object types. Kept separate from `BufferKind` since GLSL merges
/// texture+sampler into a single combined-sampler type while HLSL keeps them
/// distinct — the generator is what decides how to fold them, not the type
/// system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerKind {
    SamplerState,
    SamplerComparisonState,
}

impl SamplerKind {
    pub fn from_name(name: &str) -> Option<SamplerKind> {
        Some(match name {
            "SamplerState" => SamplerKind::SamplerState,
            "SamplerComparisonState" => SamplerKind::SamplerComparisonState,
            _ => return None,
        })
    }
}

/// A structural type. Cheaply cloned (`Rc`-shared internally where the
/// payload itself is shared, e.g. `Struct`'s field list) since the same
/// denoter tree is referenced from many expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDenoter {
    Void,
    Base(BaseType),
    /// `rows == 1` denotes a vector; `cols == 1 && rows == 1` never occurs
    /// (that's `Base`). Matrices are `rows x cols`.
    Vector(BaseType, u8),
    Matrix(BaseType, u8, u8),
    Buffer(BufferKind, Option<Rc<TypeDenoter>>),
    Sampler(SamplerKind),
    /// References a `StructDecl` by id rather than embedding its field list
    /// inline, so struct identity survives cloning the denoter.
    Struct(DeclId, Rc<str>),
    Array(Rc<TypeDenoter>, Option<u32>),
    /// A `typedef`/alias; must be resolved via [`TypeDenoter::get_aliased`]
    /// before structural inspection, per `spec.md` §3.
    Alias(Rc<str>, Rc<TypeDenoter>),
}

impl TypeDenoter {
    /// Follows an `Alias` chain to the first non-alias denoter. Idempotent
    /// on non-alias input.
    pub fn get_aliased(&self) -> &TypeDenoter {
        let mut current = self;
        while let TypeDenoter::Alias(_, target) = current {
            current = target;
        }
        current
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.get_aliased(), TypeDenoter::Base(_))
    }

    pub fn is_vector(&self) -> bool {
        matches!(self.get_aliased(), TypeDenoter::Vector(..))
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self.get_aliased(), TypeDenoter::Matrix(..))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.get_aliased(),
            TypeDenoter::Base(_) | TypeDenoter::Vector(..) | TypeDenoter::Matrix(..)
        )
    }

    /// The scalar base type underlying a scalar, vector, or matrix denoter.
    pub fn base_type(&self) -> Option<BaseType> {
        match self.get_aliased() {
            TypeDenoter::Base(b) => Some(*b),
            TypeDenoter::Vector(b, _) => Some(*b),
            TypeDenoter::Matrix(b, _, _) => Some(*b),
            _ => None,
        }
    }

    /// Number of scalar components: 1 for a scalar, N for a vector, rows*cols
    /// for a matrix. `None` for non-numeric types.
    pub fn component_count(&self) -> Option<u32> {
        match self.get_aliased() {
            TypeDenoter::Base(_) => Some(1),
            TypeDenoter::Vector(_, n) => Some(*n as u32),
            TypeDenoter::Matrix(_, r, c) => Some(*r as u32 * *c as u32),
            _ => None,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            TypeDenoter::Void => "void".to_string(),
            TypeDenoter::Base(b) => b.name().to_string(),
            TypeDenoter::Vector(b, n) => format!("{}{}", b.name(), n),
            TypeDenoter::Matrix(b, r, c) => format!("{}{}x{}", b.name(), r, c),
            TypeDenoter::Buffer(kind, _) => format!("{kind:?}"),
            TypeDenoter::Sampler(kind) => format!("{kind:?}"),
            TypeDenoter::Struct(_, name) => name.to_string(),
            TypeDenoter::Array(elem, Some(n)) => format!("{}[{}]", elem.display_name(), n),
            TypeDenoter::Array(elem, None) => format!("{}[]", elem.display_name()),
            TypeDenoter::Alias(name, _) => name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_chain_resolves_to_structural_type() {
        let inner = Rc::new(TypeDenoter::Vector(BaseType::Float, 4));
        let alias = TypeDenoter::Alias(Rc::from("float4"), inner.clone());
        assert_eq!(alias.get_aliased(), &*inner);
        assert!(alias.is_vector());
    }

    #[test]
    fn component_counts() {
        assert_eq!(TypeDenoter::Base(BaseType::Float).component_count(), Some(1));
        assert_eq!(
            TypeDenoter::Vector(BaseType::Float, 3).component_count(),
            Some(3)
        );
        assert_eq!(
            TypeDenoter::Matrix(BaseType::Float, 4, 4).component_count(),
            Some(16)
        );
    }
}
