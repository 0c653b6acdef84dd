use crate::error::{Result, SignatureError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            b'B' => BaseType::Byte,
            b'C' => BaseType::Char,
            b'D' => BaseType::Double,
            b'F' => BaseType::Float,
            b'I' => BaseType::Int,
            b'J' => BaseType::Long,
            b'S' => BaseType::Short,
            b'Z' => BaseType::Boolean,
            _ => return None,
        })
    }

    /// The Java keyword, which is also the primitive's class name.
    pub fn java_name(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSignature {
    Base(BaseType),
    Class(ClassTypeSignature),
    TypeVariable(String),
    Array(Box<TypeSignature>),
}

/// `Ljava/util/Map<TK;TV;>.Entry<TK;TV;>;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTypeSignature {
    /// Slash separated, empty for the default package.
    pub package: String,
    /// Outermost first. Never empty.
    pub segments: Vec<SimpleClassTypeSignature>,
}

impl ClassTypeSignature {
    /// Binary name of the class named by the first `upto + 1` segments (`java.util.Map$Entry`).
    pub fn binary_name_upto(&self, upto: usize) -> String {
        let mut name = String::new();
        if !self.package.is_empty() {
            name.push_str(&self.package.replace('/', "."));
            name.push('.');
        }
        for (idx, segment) in self.segments.iter().take(upto + 1).enumerate() {
            if idx > 0 {
                name.push('$');
            }
            name.push_str(&segment.name);
        }
        name
    }

    pub fn binary_name(&self) -> String {
        self.binary_name_upto(self.segments.len().saturating_sub(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleClassTypeSignature {
    pub name: String,
    pub type_arguments: Vec<TypeArgument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArgument {
    /// `*`
    Any,
    Exact(TypeSignature),
    /// `+bound`
    Extends(TypeSignature),
    /// `-bound`
    Super(TypeSignature),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<TypeSignature>,
    pub interface_bounds: Vec<TypeSignature>,
}

impl TypeParameter {
    pub fn bounds(&self) -> impl Iterator<Item = &TypeSignature> {
        self.class_bound.iter().chain(self.interface_bounds.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub super_class: ClassTypeSignature,
    pub interfaces: Vec<ClassTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<TypeSignature>,
    /// `None` for `void`.
    pub return_type: Option<TypeSignature>,
    pub throws: Vec<TypeSignature>,
}

pub fn parse_class_signature(sig: &str) -> Result<ClassSignature> {
    let mut cursor = Cursor::new(sig);
    let type_parameters = cursor.type_parameters()?;
    let super_class = cursor.class_type()?;
    let mut interfaces = Vec::new();
    while !cursor.is_done() {
        interfaces.push(cursor.class_type()?);
    }
    Ok(ClassSignature {
        type_parameters,
        super_class,
        interfaces,
    })
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSignature> {
    let mut cursor = Cursor::new(sig);
    let type_parameters = cursor.type_parameters()?;
    cursor.expect(b'(', "expected `(`")?;
    let mut parameters = Vec::new();
    while !cursor.eat(b')') {
        parameters.push(cursor.java_type()?);
    }
    let return_type = if cursor.eat(b'V') {
        None
    } else {
        Some(cursor.java_type()?)
    };
    let mut throws = Vec::new();
    while cursor.eat(b'^') {
        let thrown = match cursor.peek() {
            Some(b'T') => cursor.type_variable()?,
            _ => TypeSignature::Class(cursor.class_type()?),
        };
        throws.push(thrown);
    }
    cursor.finish()?;
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        throws,
    })
}

/// Parses a field signature. Plain descriptors such as `I` are accepted as well.
pub fn parse_field_signature(sig: &str) -> Result<TypeSignature> {
    let mut cursor = Cursor::new(sig);
    let ty = cursor.java_type()?;
    cursor.finish()?;
    Ok(ty)
}

/// Nested reference types allowed in one signature. Enough for a 255-dimension array of a class
/// type, the JVM's own limit on array dimensions.
const MAX_NESTING: usize = 256;

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn is_done(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8, message: &'static str) -> Result<()> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn finish(&self) -> Result<()> {
        if self.is_done() {
            Ok(())
        } else {
            Err(self.error("trailing input"))
        }
    }

    fn error(&self, message: &'static str) -> SignatureError {
        SignatureError::Invalid {
            signature: self.input.to_string(),
            offset: self.pos,
            message,
        }
    }

    fn identifier(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if matches!(byte, b'.' | b';' | b'[' | b'/' | b'<' | b'>' | b':') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        // Terminators are ASCII, so `start..pos` always lies on char boundaries.
        Ok(&self.input[start..self.pos])
    }

    fn type_parameters(&mut self) -> Result<Vec<TypeParameter>> {
        let mut params = Vec::new();
        if !self.eat(b'<') {
            return Ok(params);
        }
        while !self.eat(b'>') {
            let name = self.identifier()?.to_string();
            self.expect(b':', "expected `:` after type parameter name")?;
            let class_bound = match self.peek() {
                Some(b'L' | b'T' | b'[') => Some(self.reference_type()?),
                _ => None,
            };
            let mut interface_bounds = Vec::new();
            while self.eat(b':') {
                interface_bounds.push(self.reference_type()?);
            }
            params.push(TypeParameter {
                name,
                class_bound,
                interface_bounds,
            });
        }
        if params.is_empty() {
            return Err(self.error("empty type parameter list"));
        }
        Ok(params)
    }

    fn java_type(&mut self) -> Result<TypeSignature> {
        if let Some(base) = self.peek().and_then(BaseType::from_tag) {
            self.pos += 1;
            return Ok(TypeSignature::Base(base));
        }
        self.reference_type()
    }

    fn reference_type(&mut self) -> Result<TypeSignature> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("signature nesting too deep"));
        }
        self.depth += 1;
        let ty = self.reference_type_at_depth();
        self.depth -= 1;
        ty
    }

    fn reference_type_at_depth(&mut self) -> Result<TypeSignature> {
        match self.peek() {
            Some(b'L') => Ok(TypeSignature::Class(self.class_type()?)),
            Some(b'T') => self.type_variable(),
            Some(b'[') => {
                self.pos += 1;
                Ok(TypeSignature::Array(Box::new(self.java_type()?)))
            }
            _ => Err(self.error("expected reference type signature")),
        }
    }

    fn type_variable(&mut self) -> Result<TypeSignature> {
        self.expect(b'T', "expected `T`")?;
        let name = self.identifier()?.to_string();
        self.expect(b';', "expected `;` after type variable")?;
        Ok(TypeSignature::TypeVariable(name))
    }

    fn class_type(&mut self) -> Result<ClassTypeSignature> {
        self.expect(b'L', "expected class type signature")?;
        let mut package = String::new();
        let mut name = self.identifier()?;
        while self.eat(b'/') {
            if !package.is_empty() {
                package.push('/');
            }
            package.push_str(name);
            name = self.identifier()?;
        }

        let mut segments = vec![SimpleClassTypeSignature {
            name: name.to_string(),
            type_arguments: self.type_arguments()?,
        }];
        while self.eat(b'.') {
            let name = self.identifier()?.to_string();
            segments.push(SimpleClassTypeSignature {
                name,
                type_arguments: self.type_arguments()?,
            });
        }
        self.expect(b';', "expected `;` after class type")?;
        Ok(ClassTypeSignature { package, segments })
    }

    fn type_arguments(&mut self) -> Result<Vec<TypeArgument>> {
        let mut args = Vec::new();
        if !self.eat(b'<') {
            return Ok(args);
        }
        while !self.eat(b'>') {
            let arg = match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    TypeArgument::Any
                }
                Some(b'+') => {
                    self.pos += 1;
                    TypeArgument::Extends(self.reference_type()?)
                }
                Some(b'-') => {
                    self.pos += 1;
                    TypeArgument::Super(self.reference_type()?)
                }
                _ => TypeArgument::Exact(self.reference_type()?),
            };
            args.push(arg);
        }
        if args.is_empty() {
            return Err(self.error("empty type argument list"));
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(package: &str, name: &str) -> ClassTypeSignature {
        ClassTypeSignature {
            package: package.to_string(),
            segments: vec![SimpleClassTypeSignature {
                name: name.to_string(),
                type_arguments: Vec::new(),
            }],
        }
    }

    #[test]
    fn parses_base_and_array_field_signatures() {
        assert_eq!(
            parse_field_signature("[[I").unwrap(),
            TypeSignature::Array(Box::new(TypeSignature::Array(Box::new(
                TypeSignature::Base(BaseType::Int)
            ))))
        );
        assert_eq!(
            parse_field_signature("TT;").unwrap(),
            TypeSignature::TypeVariable("T".to_string())
        );
    }

    #[test]
    fn parses_wildcard_arguments() {
        let sig = parse_field_signature("Ljava/util/Map<*+Ljava/lang/Number;-TT;>;").unwrap();
        let TypeSignature::Class(map) = sig else {
            panic!("expected class type");
        };
        assert_eq!(map.binary_name(), "java.util.Map");
        assert_eq!(
            map.segments[0].type_arguments,
            vec![
                TypeArgument::Any,
                TypeArgument::Extends(TypeSignature::Class(class("java/lang", "Number"))),
                TypeArgument::Super(TypeSignature::TypeVariable("T".to_string())),
            ]
        );
    }

    #[test]
    fn nested_segments_build_binary_names() {
        let sig = parse_field_signature("Lcom/example/Outer<TT;>.Inner<TU;>.Leaf;").unwrap();
        let TypeSignature::Class(class) = sig else {
            panic!("expected class type");
        };
        assert_eq!(class.segments.len(), 3);
        assert_eq!(class.binary_name_upto(0), "com.example.Outer");
        assert_eq!(class.binary_name_upto(1), "com.example.Outer$Inner");
        assert_eq!(class.binary_name(), "com.example.Outer$Inner$Leaf");
    }

    #[test]
    fn default_package_has_no_prefix() {
        let TypeSignature::Class(class) = parse_field_signature("LFoo;").unwrap() else {
            panic!("expected class type");
        };
        assert_eq!(class.binary_name(), "Foo");
    }

    #[test]
    fn parses_class_signature_with_interface_bounds() {
        let sig = parse_class_signature(
            "<T::Ljava/lang/Comparable<TT;>;>Ljava/lang/Object;Ljava/io/Serializable;",
        )
        .unwrap();
        assert_eq!(sig.type_parameters.len(), 1);
        let param = &sig.type_parameters[0];
        assert_eq!(param.name, "T");
        assert_eq!(param.class_bound, None);
        assert_eq!(param.interface_bounds.len(), 1);
        assert_eq!(sig.super_class, class("java/lang", "Object"));
        assert_eq!(sig.interfaces, vec![class("java/io", "Serializable")]);
    }

    #[test]
    fn parses_method_signature() {
        let sig =
            parse_method_signature("<E:Ljava/lang/Object;>([TE;I)Ljava/util/List<TE;>;^TX;")
                .unwrap();
        assert_eq!(sig.type_parameters[0].name, "E");
        assert_eq!(sig.parameters.len(), 2);
        assert!(sig.return_type.is_some());
        assert_eq!(sig.throws, vec![TypeSignature::TypeVariable("X".to_string())]);

        let void = parse_method_signature("()V").unwrap();
        assert_eq!(void.return_type, None);
        assert!(void.parameters.is_empty());
    }

    #[test]
    fn reports_offset_of_malformed_input() {
        let err = parse_field_signature("Ljava/util/List<>;").unwrap_err();
        assert_eq!(
            err,
            SignatureError::Invalid {
                signature: "Ljava/util/List<>;".to_string(),
                offset: 17,
                message: "empty type argument list",
            }
        );

        assert!(matches!(
            parse_field_signature("Ljava/lang/String"),
            Err(SignatureError::Invalid { .. })
        ));
        assert!(matches!(
            parse_method_signature("(I)VX"),
            Err(SignatureError::Invalid { message: "trailing input", .. })
        ));
        assert!(matches!(
            parse_class_signature("<>Ljava/lang/Object;"),
            Err(SignatureError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_excessive_nesting() {
        let dims = 255;
        let sig = format!("{}Ljava/lang/String;", "[".repeat(dims));
        let mut ty = parse_field_signature(&sig).unwrap();
        let mut seen = 0;
        while let TypeSignature::Array(component) = ty {
            ty = *component;
            seen += 1;
        }
        assert_eq!(seen, dims);

        let err = parse_field_signature(&format!("{}I", "[".repeat(65_000))).unwrap_err();
        assert_eq!(
            err,
            SignatureError::Invalid {
                signature: format!("{}I", "[".repeat(65_000)),
                offset: MAX_NESTING,
                message: "signature nesting too deep",
            }
        );

        let nested_args = format!(
            "{}Ljava/lang/String;{}",
            "Ljava/util/List<".repeat(300),
            ">;".repeat(300)
        );
        assert!(matches!(
            parse_field_signature(&nested_args),
            Err(SignatureError::Invalid {
                message: "signature nesting too deep",
                ..
            })
        ));
    }
}
