use std::fmt;
use std::str::FromStr;

use crate::error::MarshalError;

/// Protocol primitive type id.
///
/// Kept as the raw numeric id so schemas carrying ids this engine has no
/// slot for still load; the encoder rejects them with `UnknownPrimitiveKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveTypeId(pub u16);

impl PrimitiveTypeId {
    pub const BOOL: Self = Self(0x0006);
    pub const INT8: Self = Self(0x0007);
    pub const UINT8: Self = Self(0x0005);
    pub const INT16: Self = Self(0x0008);
    pub const UINT16: Self = Self(0x0009);
    pub const INT32: Self = Self(0x0001);
    pub const UINT32: Self = Self(0x0002);
    pub const INT64: Self = Self(0x0003);
    pub const UINT64: Self = Self(0x0004);
    pub const FLOAT: Self = Self(0x0021);
    pub const DOUBLE: Self = Self(0x0020);
    pub const DATE: Self = Self(0x0030);
    pub const DATETIME: Self = Self(0x0031);
    pub const TIMESTAMP: Self = Self(0x0032);
    pub const INTERVAL: Self = Self(0x0033);
    pub const TZ_DATE: Self = Self(0x0034);
    pub const TZ_DATETIME: Self = Self(0x0035);
    pub const TZ_TIMESTAMP: Self = Self(0x0036);
    pub const STRING: Self = Self(0x1001);
    pub const UTF8: Self = Self(0x1200);
    pub const YSON: Self = Self(0x1201);
    pub const JSON: Self = Self(0x1202);
    pub const UUID: Self = Self(0x1203);
    pub const JSON_DOCUMENT: Self = Self(0x1204);
    pub const DYNUMBER: Self = Self(0x1302);

    const NAMES: &'static [(PrimitiveTypeId, &'static str)] = &[
        (Self::BOOL, "Bool"),
        (Self::INT8, "Int8"),
        (Self::UINT8, "Uint8"),
        (Self::INT16, "Int16"),
        (Self::UINT16, "Uint16"),
        (Self::INT32, "Int32"),
        (Self::UINT32, "Uint32"),
        (Self::INT64, "Int64"),
        (Self::UINT64, "Uint64"),
        (Self::FLOAT, "Float"),
        (Self::DOUBLE, "Double"),
        (Self::DATE, "Date"),
        (Self::DATETIME, "Datetime"),
        (Self::TIMESTAMP, "Timestamp"),
        (Self::INTERVAL, "Interval"),
        (Self::TZ_DATE, "TzDate"),
        (Self::TZ_DATETIME, "TzDatetime"),
        (Self::TZ_TIMESTAMP, "TzTimestamp"),
        (Self::STRING, "String"),
        (Self::UTF8, "Utf8"),
        (Self::YSON, "Yson"),
        (Self::JSON, "Json"),
        (Self::UUID, "Uuid"),
        (Self::JSON_DOCUMENT, "JsonDocument"),
        (Self::DYNUMBER, "DyNumber"),
    ];

    pub fn name(self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(id, _)| *id == self)
            .map(|(_, name)| *name)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(id, _)| *id)
    }
}

impl fmt::Display for PrimitiveTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Primitive({})", self.0),
        }
    }
}

/// A named member of a `Struct` type. Position in the member list is
/// significant: values are zipped against members by index.
#[derive(Debug, Clone, PartialEq)]
pub struct StructMember {
    pub name: String,
    pub ty: DeclaredType,
}

/// Schema-level description of a value's shape.
///
/// Serializes as its textual form (`Optional<Utf8>`, `Struct<id:Uint64>`),
/// so schemas can live in config files.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeclaredType {
    Primitive(PrimitiveTypeId),
    /// Recognized, but encoding always fails.
    Decimal { precision: u8, scale: u8 },
    Optional(Box<DeclaredType>),
    List(Box<DeclaredType>),
    Tuple(Vec<DeclaredType>),
    Struct(Vec<StructMember>),
    Dict {
        key: Box<DeclaredType>,
        payload: Box<DeclaredType>,
    },
    /// Recognized, but encoding always fails. Inner is a Tuple or Struct.
    Variant(Box<DeclaredType>),
}

impl DeclaredType {
    pub fn primitive(id: PrimitiveTypeId) -> Self {
        Self::Primitive(id)
    }

    pub fn optional(inner: DeclaredType) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn list(item: DeclaredType) -> Self {
        Self::List(Box::new(item))
    }

    pub fn tuple(elements: impl IntoIterator<Item = DeclaredType>) -> Self {
        Self::Tuple(elements.into_iter().collect())
    }

    pub fn structure<N: Into<String>>(members: impl IntoIterator<Item = (N, DeclaredType)>) -> Self {
        Self::Struct(
            members
                .into_iter()
                .map(|(name, ty)| StructMember { name: name.into(), ty })
                .collect(),
        )
    }

    pub fn dict(key: DeclaredType, payload: DeclaredType) -> Self {
        Self::Dict {
            key: Box::new(key),
            payload: Box::new(payload),
        }
    }

    pub fn decimal(precision: u8, scale: u8) -> Self {
        Self::Decimal { precision, scale }
    }

    pub fn variant(inner: DeclaredType) -> Self {
        Self::Variant(Box::new(inner))
    }

    /// Tag name of the outermost type constructor.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "Primitive",
            Self::Decimal { .. } => "Decimal",
            Self::Optional(_) => "Optional",
            Self::List(_) => "List",
            Self::Tuple(_) => "Tuple",
            Self::Struct(_) => "Struct",
            Self::Dict { .. } => "Dict",
            Self::Variant(_) => "Variant",
        }
    }

    pub fn list_item(&self) -> Option<&DeclaredType> {
        match self {
            Self::List(item) => Some(item),
            _ => None,
        }
    }

    pub fn struct_members(&self) -> Option<&[StructMember]> {
        match self {
            Self::Struct(members) => Some(members),
            _ => None,
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(id) => write!(f, "{id}"),
            Self::Decimal { precision, scale } => write!(f, "Decimal({precision},{scale})"),
            Self::Optional(inner) => write!(f, "Optional<{inner}>"),
            Self::List(item) => write!(f, "List<{item}>"),
            Self::Tuple(elements) => {
                f.write_str("Tuple<")?;
                for (i, ty) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{ty}")?;
                }
                f.write_str(">")
            }
            Self::Struct(members) => {
                f.write_str("Struct<")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{}", m.name, m.ty)?;
                }
                f.write_str(">")
            }
            Self::Dict { key, payload } => write!(f, "Dict<{key},{payload}>"),
            Self::Variant(inner) => write!(f, "Variant<{inner}>"),
        }
    }
}

impl FromStr for DeclaredType {
    type Err = MarshalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser { src: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(ty)
    }
}

impl TryFrom<String> for DeclaredType {
    type Error = MarshalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeclaredType> for String {
    fn from(ty: DeclaredType) -> Self {
        ty.to_string()
    }
}

// ---------------------------------------------------------------------------
// Type string parser
// ---------------------------------------------------------------------------

struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl TypeParser<'_> {
    fn error(&self, message: impl Into<String>) -> MarshalError {
        MarshalError::TypeSyntax {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), MarshalError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}'")))
        }
    }

    fn ident(&mut self) -> Result<&str, MarshalError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected identifier"));
        }
        Ok(&self.src[start..self.pos])
    }

    fn number<T: FromStr>(&mut self) -> Result<T, MarshalError> {
        let start = self.pos;
        let digits = self.ident()?;
        digits.parse().map_err(|_| MarshalError::TypeSyntax {
            offset: start,
            message: format!("invalid number '{digits}'"),
        })
    }

    /// Comma-separated list closed by `close`; the opening bracket is
    /// already consumed.
    fn list_of<T>(
        &mut self,
        close: char,
        mut item: impl FnMut(&mut Self) -> Result<T, MarshalError>,
    ) -> Result<Vec<T>, MarshalError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(item(self)?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(',')?;
        }
    }

    fn parse_type(&mut self) -> Result<DeclaredType, MarshalError> {
        let start = self.pos;
        let name = self.ident()?.to_string();
        match name.as_str() {
            "Optional" => {
                self.expect('<')?;
                let inner = self.parse_type()?;
                self.expect('>')?;
                Ok(DeclaredType::optional(inner))
            }
            "List" => {
                self.expect('<')?;
                let item = self.parse_type()?;
                self.expect('>')?;
                Ok(DeclaredType::list(item))
            }
            "Tuple" => {
                self.expect('<')?;
                Ok(DeclaredType::Tuple(self.list_of('>', Self::parse_type)?))
            }
            "Struct" => {
                self.expect('<')?;
                let members = self.list_of('>', |p| {
                    let name = p.ident()?.to_string();
                    p.expect(':')?;
                    let ty = p.parse_type()?;
                    Ok(StructMember { name, ty })
                })?;
                Ok(DeclaredType::Struct(members))
            }
            "Dict" => {
                self.expect('<')?;
                let key = self.parse_type()?;
                self.expect(',')?;
                let payload = self.parse_type()?;
                self.expect('>')?;
                Ok(DeclaredType::dict(key, payload))
            }
            "Decimal" => {
                self.expect('(')?;
                let precision = self.number()?;
                self.expect(',')?;
                let scale = self.number()?;
                self.expect(')')?;
                Ok(DeclaredType::decimal(precision, scale))
            }
            "Variant" => {
                self.expect('<')?;
                let at = self.pos;
                let inner = self.parse_type()?;
                if !matches!(inner, DeclaredType::Tuple(_) | DeclaredType::Struct(_)) {
                    return Err(MarshalError::TypeSyntax {
                        offset: at,
                        message: "variant must wrap a Tuple or Struct".to_string(),
                    });
                }
                self.expect('>')?;
                Ok(DeclaredType::variant(inner))
            }
            "Primitive" => {
                self.expect('(')?;
                let id = self.number()?;
                self.expect(')')?;
                Ok(DeclaredType::Primitive(PrimitiveTypeId(id)))
            }
            other => PrimitiveTypeId::from_name(other)
                .map(DeclaredType::Primitive)
                .ok_or_else(|| {
                    MarshalError::UnknownType(other.to_string()).with_context(format!("offset {start}"))
                }),
        }
    }
}
