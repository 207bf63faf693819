//! Declarations read from a Go source file.

use crate::typemap::TypeShape;
use std::fmt;

/// One parsed Go file, reduced to its type declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub package: String,
    pub decls: Vec<TypeDecl>,
}

impl SourceFile {
    /// Struct declarations in source order.
    pub fn structs(&self) -> impl Iterator<Item = (&TypeDecl, &[StructField])> {
        self.decls.iter().filter_map(|decl| match &decl.ty {
            TypeExpr::Struct(fields) if !decl.alias => Some((decl, fields.as_slice())),
            _ => None,
        })
    }

    /// Find an interface declaration by name.
    pub fn interface(&self, name: &str) -> Option<&[InterfaceMethod]> {
        self.decls.iter().find_map(|decl| match &decl.ty {
            TypeExpr::Interface(methods) if decl.name == name => Some(methods.as_slice()),
            _ => None,
        })
    }
}

/// `type Name[params] = Type` or `type Name Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub doc: Vec<String>,
    pub ty: TypeExpr,
    /// Declared with `=`.
    pub alias: bool,
    /// Declared with type parameters.
    pub generic: bool,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    /// Empty for embedded fields.
    pub names: Vec<String>,
    pub ty: TypeExpr,
    /// Raw tag content without quotes.
    pub tag: Option<String>,
    pub doc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceMethod {
    pub name: String,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub doc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

/// Go type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(String),
    Qualified {
        package: String,
        name: String,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array {
        len: String,
        elem: Box<TypeExpr>,
    },
    /// `...T` in a parameter list.
    Variadic(Box<TypeExpr>),
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Chan(Box<TypeExpr>),
    Func {
        params: Vec<Param>,
        results: Vec<Param>,
    },
    Struct(Vec<StructField>),
    Interface(Vec<InterfaceMethod>),
    Generic {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
}

impl TypeExpr {
    /// Structural classification used by the type table.
    pub fn shape(&self) -> TypeShape {
        match self {
            TypeExpr::Named(name) => TypeShape::Named(name.clone()),
            TypeExpr::Qualified { package, name } => TypeShape::Qualified {
                package: package.clone(),
                name: name.clone(),
            },
            TypeExpr::Pointer(inner) => TypeShape::Pointer(Box::new(inner.shape())),
            TypeExpr::Slice(elem) | TypeExpr::Variadic(elem) | TypeExpr::Array { elem, .. } => {
                TypeShape::Slice(Box::new(elem.shape()))
            }
            other => TypeShape::Other(other.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TypeExpr::Named(name) if name == "error")
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[Param]) -> fmt::Result {
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        match &param.name {
            Some(name) => write!(f, "{name} {}", param.ty)?,
            None => write!(f, "{}", param.ty)?,
        }
    }
    Ok(())
}

fn write_signature(f: &mut fmt::Formatter<'_>, params: &[Param], results: &[Param]) -> fmt::Result {
    write!(f, "(")?;
    write_params(f, params)?;
    write!(f, ")")?;
    match results {
        [] => Ok(()),
        [single] if single.name.is_none() => write!(f, " {}", single.ty),
        _ => {
            write!(f, " (")?;
            write_params(f, results)?;
            write!(f, ")")
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => write!(f, "{name}"),
            TypeExpr::Qualified { package, name } => write!(f, "{package}.{name}"),
            TypeExpr::Pointer(inner) => write!(f, "*{inner}"),
            TypeExpr::Slice(elem) => write!(f, "[]{elem}"),
            TypeExpr::Array { len, elem } => write!(f, "[{len}]{elem}"),
            TypeExpr::Variadic(elem) => write!(f, "...{elem}"),
            TypeExpr::Map { key, value } => write!(f, "map[{key}]{value}"),
            TypeExpr::Chan(elem) => write!(f, "chan {elem}"),
            TypeExpr::Func { params, results } => {
                write!(f, "func")?;
                write_signature(f, params, results)
            }
            TypeExpr::Struct(fields) if fields.is_empty() => write!(f, "struct{{}}"),
            TypeExpr::Struct(fields) => {
                write!(f, "struct{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    if !field.names.is_empty() {
                        write!(f, "{} ", field.names.join(", "))?;
                    }
                    write!(f, "{}", field.ty)?;
                }
                write!(f, " }}")
            }
            TypeExpr::Interface(methods) if methods.is_empty() => write!(f, "interface{{}}"),
            TypeExpr::Interface(methods) => {
                write!(f, "interface{{ ")?;
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", method.name)?;
                    write_signature(f, &method.params, &method.results)?;
                }
                write!(f, " }}")
            }
            TypeExpr::Generic { base, args } => {
                write!(f, "{base}[")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, "]")
            }
        }
    }
}
